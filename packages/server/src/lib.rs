// Cadena Referral Network - Governance Core
//
// This crate implements the disciplinary governance engine for the referral
// network: inactivity detection, staged warnings, peer-committee expulsion
// votes with quorum/timeout resolution, reentry gating, and the permanent
// ban registry. Architecture follows domain-driven design; external
// collaborators (push delivery, ranking, points ledger) sit behind
// capability traits in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
