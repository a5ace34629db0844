//! Application setup and server configuration.

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    cast_vote_handler, check_registration_handler, decide_reentry_handler, file_reentry_handler,
    get_case_handler, health_handler, member_standing_handler,
};

/// Shared application state
///
/// Authentication lives in the outer gateway; these routes assume the
/// caller's identity fields (voter_id, admin_id) were already verified.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: ServerDeps,
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps) -> Router {
    let app_state = AppState {
        db_pool: deps.db_pool.clone(),
        deps,
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        // Committee voting
        .route("/cases/:case_id", get(get_case_handler))
        .route("/cases/:case_id/votes", post(cast_vote_handler))
        // Member standing (read side)
        .route("/members/:member_id", get(member_standing_handler))
        // Reentry
        .route("/reentry-requests", post(file_reentry_handler))
        .route(
            "/reentry-requests/:request_id/decision",
            post(decide_reentry_handler),
        )
        // Registration boundary
        .route("/registration-check", get(check_registration_handler))
        // Health check
        .route("/health", get(health_handler))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
