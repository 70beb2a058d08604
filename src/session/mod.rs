//! Session management
//!
//! Session codes and the registry pairing connections under them.

pub mod code;
pub mod registry;

pub use code::{SessionCode, coerce_code};
pub use registry::{JoinResult, SESSION_CAPACITY, SessionRegistry, SharedRegistry};
