//! Shared types and error helpers used across all chanrelay crates.

pub mod error;
pub mod types;

pub use {error::FromMessage, types::IncomingMessage};
