pub mod ban_entry;

pub use ban_entry::{BanEntry, IdentifierType};
