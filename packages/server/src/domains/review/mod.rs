// Review domain: disciplinary case engine + quorum voter.
//
// The quorum module is the generic decision primitive (first choice to a
// majority wins); the case engine owns the pending → decided/expired
// lifecycle and the member side effects of each outcome.

pub mod actions;
pub mod errors;
pub mod models;
pub mod quorum;

pub use errors::VoteError;
