//! Subcommand implementations.

pub mod analyze;
pub mod hash;
pub mod registry;
pub mod verify;
