//! Server core functionality
//!
//! Listener and the axum router serving relay connections and the liveness
//! response on one port.

pub mod core;

pub use self::core::{LIVENESS_BODY, Server};
