//! Module `messages`
//!
//! Wire shapes exchanged with peers. Outbound control messages are tagged by a
//! `type` field; inbound messages are only inspected far enough to spot `join`.

use serde::Serialize;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::session::coerce_code;

/// Messages the relay itself originates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined { code: String, players: usize },
    Error { message: String },
    PeerJoined,
    PeerLeft,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing a plain tagged enum of strings and integers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A parsed inbound message.
#[derive(Debug, PartialEq, Eq)]
pub enum ClientMessage<'a> {
    /// Control message; `code` is already coerced and trimmed but not validated.
    Join { code: String },
    /// Anything else, carried as the original text.
    Relay(&'a str),
}

/// Parses a raw payload. Any JSON value except `null` is accepted; only
/// objects whose `type` is `"join"` are interpreted.
pub fn parse_message(raw: &str) -> Result<ClientMessage<'_>, ProtocolError> {
    let value: Value = serde_json::from_str(raw)?;

    match value {
        Value::Null => Err(ProtocolError::MalformedPayload("payload is null".into())),
        Value::Object(fields) if fields.get("type").and_then(Value::as_str) == Some("join") => {
            Ok(ClientMessage::Join {
                code: coerce_code(fields.get("code")),
            })
        }
        _ => Ok(ClientMessage::Relay(raw)),
    }
}
