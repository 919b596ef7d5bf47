//! CLI command implementations

pub mod issue;
pub mod key;
pub mod status;
pub mod verify;
