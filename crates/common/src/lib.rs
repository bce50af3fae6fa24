//! Shared types for the serial command queue workspace.

pub mod types;

pub use types::CommandId;
