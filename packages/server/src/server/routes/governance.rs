//! Governance JSON routes.
//!
//! The admin/committee UI reads case, vote and reentry records here and
//! invokes cast_vote / decide_reentry; it never writes case status directly.
//! Error mapping is deliberately specific: committee members see "already
//! voted" / "already decided", not a generic failure.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{CaseId, MemberId, ReentryRequestId};
use crate::domains::member::actions::{get_member_standing, MemberStanding};
use crate::domains::ban_registry::actions::{check_registration, RegistrationCheck};
use crate::domains::reentry::actions::{decide_reentry, file_reentry_request};
use crate::domains::reentry::errors::ReentryError;
use crate::domains::review::actions::{cast_vote, get_case, VoteOutcome};
use crate::domains::review::errors::VoteError;
use crate::domains::review::quorum::{QuorumChoice, VoteChoice};
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: message }))
}

// ============================================================================
// Cases & votes
// ============================================================================

#[derive(Deserialize)]
pub struct CastVoteRequest {
    pub voter_id: Uuid,
    pub choice: String,
    pub reasoning: String,
}

#[derive(Serialize)]
pub struct CastVoteResponse {
    pub case_id: CaseId,
    pub case_status: String,
    pub outcome: String,
    pub votes_for_expulsion: i32,
    pub votes_against: i32,
    pub votes_to_extend: i32,
}

fn vote_error_response(err: VoteError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        VoteError::CaseNotFound(_) => StatusCode::NOT_FOUND,
        VoteError::CaseAlreadyDecided { .. } | VoteError::AlreadyVoted => StatusCode::CONFLICT,
        VoteError::EmptyReasoning | VoteError::InvalidChoice(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        VoteError::VoterNotOnCommittee => StatusCode::FORBIDDEN,
        VoteError::Database(_) | VoteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

pub async fn cast_vote_handler(
    Extension(state): Extension<AppState>,
    Path(case_id): Path<Uuid>,
    Json(req): Json<CastVoteRequest>,
) -> Result<Json<CastVoteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let choice = VoteChoice::parse(&req.choice)
        .ok_or_else(|| vote_error_response(VoteError::InvalidChoice(req.choice.clone())))?;

    let result = cast_vote(
        CaseId::from_uuid(case_id),
        MemberId::from_uuid(req.voter_id),
        choice,
        &req.reasoning,
        Utc::now(),
        &state.deps,
    )
    .await
    .map_err(vote_error_response)?;

    let outcome = match result.outcome {
        VoteOutcome::Pending => "pending",
        VoteOutcome::Expelled => "expelled",
        VoteOutcome::Absolved => "absolved",
        VoteOutcome::Extended => "extended",
        VoteOutcome::AlreadyDecided => "already_decided",
    };

    Ok(Json(CastVoteResponse {
        case_id: result.case.id,
        case_status: result.case.status.clone(),
        outcome: outcome.to_string(),
        votes_for_expulsion: result.case.votes_for_expulsion,
        votes_against: result.case.votes_against,
        votes_to_extend: result.case.votes_to_extend,
    }))
}

#[derive(Serialize)]
pub struct CaseResponse {
    pub id: CaseId,
    pub member_id: MemberId,
    pub trigger_type: String,
    pub trigger_details: serde_json::Value,
    pub status: String,
    pub committee_snapshot: Vec<MemberId>,
    pub votes_for_expulsion: i32,
    pub votes_against: i32,
    pub votes_to_extend: i32,
    pub extension_count: i32,
    pub auto_expire_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub votes: Vec<VoteView>,
}

#[derive(Serialize)]
pub struct VoteView {
    pub voter_id: MemberId,
    pub choice: String,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

pub async fn get_case_handler(
    Extension(state): Extension<AppState>,
    Path(case_id): Path<Uuid>,
) -> Result<Json<CaseResponse>, (StatusCode, Json<ErrorResponse>)> {
    let found = get_case(CaseId::from_uuid(case_id), &state.deps)
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let (case, votes) = found.ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Review case not found: {}", case_id),
        )
    })?;

    Ok(Json(CaseResponse {
        id: case.id,
        member_id: case.member_id,
        trigger_type: case.trigger_type,
        trigger_details: case.trigger_details,
        status: case.status,
        committee_snapshot: case.committee_snapshot,
        votes_for_expulsion: case.votes_for_expulsion,
        votes_against: case.votes_against,
        votes_to_extend: case.votes_to_extend,
        extension_count: case.extension_count,
        auto_expire_at: case.auto_expire_at,
        decided_at: case.decided_at,
        votes: votes
            .into_iter()
            .map(|v| VoteView {
                voter_id: v.voter_id,
                choice: v.choice,
                reasoning: v.reasoning,
                created_at: v.created_at,
            })
            .collect(),
    }))
}

// ============================================================================
// Member standing
// ============================================================================

pub async fn member_standing_handler(
    Extension(state): Extension<AppState>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberStanding>, (StatusCode, Json<ErrorResponse>)> {
    get_member_standing(MemberId::from_uuid(member_id), &state.deps)
        .await
        .map(Json)
        .map_err(|e| error_response(StatusCode::NOT_FOUND, e.to_string()))
}

// ============================================================================
// Reentry
// ============================================================================

#[derive(Deserialize)]
pub struct FileReentryRequest {
    pub member_id: Uuid,
    pub reason: String,
}

#[derive(Deserialize)]
pub struct DecideReentryRequest {
    pub admin_id: Uuid,
    pub approve: bool,
    pub admin_notes: Option<String>,
}

#[derive(Serialize)]
pub struct ReentryRequestResponse {
    pub id: ReentryRequestId,
    pub member_id: MemberId,
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

fn reentry_error_response(err: ReentryError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ReentryError::MemberNotFound(_) | ReentryError::RequestNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ReentryError::NotExpelled
        | ReentryError::PermanentlyBanned
        | ReentryError::CooldownActive { .. } => StatusCode::CONFLICT,
        ReentryError::AlreadyReviewed { .. } => StatusCode::CONFLICT,
        ReentryError::Database(_) | ReentryError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.to_string())
}

fn reentry_response(
    request: crate::domains::reentry::models::ReentryRequest,
) -> ReentryRequestResponse {
    ReentryRequestResponse {
        id: request.id,
        member_id: request.member_id,
        status: request.status,
        admin_notes: request.admin_notes,
        created_at: request.created_at,
        reviewed_at: request.reviewed_at,
    }
}

pub async fn file_reentry_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<FileReentryRequest>,
) -> Result<Json<ReentryRequestResponse>, (StatusCode, Json<ErrorResponse>)> {
    file_reentry_request(
        MemberId::from_uuid(req.member_id),
        &req.reason,
        Utc::now(),
        &state.deps,
    )
    .await
    .map(|r| Json(reentry_response(r)))
    .map_err(reentry_error_response)
}

pub async fn decide_reentry_handler(
    Extension(state): Extension<AppState>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<DecideReentryRequest>,
) -> Result<Json<ReentryRequestResponse>, (StatusCode, Json<ErrorResponse>)> {
    decide_reentry(
        ReentryRequestId::from_uuid(request_id),
        req.admin_id,
        req.approve,
        req.admin_notes.as_deref(),
        Utc::now(),
        &state.deps,
    )
    .await
    .map(|r| Json(reentry_response(r)))
    .map_err(reentry_error_response)
}

// ============================================================================
// Registration boundary
// ============================================================================

#[derive(Deserialize)]
pub struct RegistrationCheckParams {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
}

pub async fn check_registration_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<RegistrationCheckParams>,
) -> Result<Json<RegistrationCheck>, (StatusCode, Json<ErrorResponse>)> {
    check_registration(
        params.email.as_deref(),
        params.phone.as_deref(),
        params.tax_id.as_deref(),
        &state.deps,
    )
    .await
    .map(Json)
    .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
