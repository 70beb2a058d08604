//! Error types
//!
//! Defines domain-specific error types for each module of the relay.

use std::fmt;
use std::io;

use crate::client::ClientId;
use crate::session::SessionCode;

/// Session registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    InvalidCode(String),
    SessionFull(SessionCode),
}

impl SessionError {
    /// Message sent back to the peer in an `error` notification.
    pub fn client_message(&self) -> &'static str {
        match self {
            SessionError::InvalidCode(_) => "Invalid code",
            SessionError::SessionFull(_) => "Lobby full",
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidCode(c) => write!(f, "Invalid session code: {:?}", c),
            SessionError::SessionFull(c) => write!(f, "Session {} is full", c),
        }
    }
}

impl std::error::Error for SessionError {}

/// Inbound payload errors
#[derive(Debug)]
pub enum ProtocolError {
    MalformedPayload(String),
    NotUtf8,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedPayload(e) => write!(f, "Malformed payload: {}", e),
            ProtocolError::NotUtf8 => write!(f, "Binary payload is not valid UTF-8"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<serde_json::Error> for ProtocolError {
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::MalformedPayload(error.to_string())
    }
}

/// Outbound delivery errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    ChannelClosed(ClientId),
    QueueFull(ClientId),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::ChannelClosed(id) => write!(f, "Channel to client {} is closed", id),
            SendError::QueueFull(id) => write!(f, "Send queue of client {} is full", id),
        }
    }
}

impl std::error::Error for SendError {}

/// Process-level relay error; only raised while starting or serving the listener
#[derive(Debug)]
pub enum RelayServerError {
    Config(config::ConfigError),
    Io(io::Error),
}

impl fmt::Display for RelayServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayServerError::Config(e) => write!(f, "Configuration error: {}", e),
            RelayServerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for RelayServerError {}

impl From<config::ConfigError> for RelayServerError {
    fn from(error: config::ConfigError) -> Self {
        RelayServerError::Config(error)
    }
}

impl From<io::Error> for RelayServerError {
    fn from(error: io::Error) -> Self {
        RelayServerError::Io(error)
    }
}
