//! Error handling
//!
//! Defines error types for the relay.

pub mod types;

pub use types::*;
