pub mod review_case;
pub mod vote;

pub use review_case::{CaseStatus, ReviewCase, TriggerType};
pub use vote::Vote;
