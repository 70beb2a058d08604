//! Relay protocol implementation
//!
//! Handles message parsing, control message dispatch and verbatim relaying.

pub mod handlers;
pub mod messages;

pub use handlers::{DropReason, RouteOutcome, handle_message};
pub use messages::{ClientMessage, ServerMessage, parse_message};
