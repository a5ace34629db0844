pub mod governance;
pub mod health;

pub use governance::{
    cast_vote_handler, check_registration_handler, decide_reentry_handler, file_reentry_handler,
    get_case_handler, member_standing_handler,
};
pub use health::health_handler;
