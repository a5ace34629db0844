pub mod reentry_request;

pub use reentry_request::{ReentryRequest, RequestStatus};
