// Shared utilities

pub mod expo;

pub use expo::ExpoClient;
