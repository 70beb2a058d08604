//! Client connection management
//!
//! Connection handles and the per-connection receive loop.

pub mod handle;
pub mod handler;

pub use handle::{ClientHandle, ClientId};
pub use handler::handle_client;
