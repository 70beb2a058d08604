//! Module `code`
//!
//! Session codes are six decimal digits agreed on by the peers out-of-band.

use serde_json::Value;
use std::fmt;

use crate::error::SessionError;

/// Number of digits in a session code.
pub const CODE_LENGTH: usize = 6;

/// A validated session code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionCode(String);

impl SessionCode {
    /// Validates `raw` as exactly six ASCII digits. No trimming is applied here.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        if raw.len() == CODE_LENGTH && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_string()))
        } else {
            Err(SessionError::InvalidCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coerces the `code` field of a join message into a trimmed string.
///
/// Falsy values (missing, `null`, `false`, `0`, `""`) yield an empty string,
/// which then fails validation. Everything else is rendered the way a
/// JavaScript peer would stringify it: integral numbers without a fraction,
/// arrays as their comma-joined elements.
pub fn coerce_code(value: Option<&Value>) -> String {
    let coerced = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(value) => render(value),
    };
    coerced.trim().to_string()
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
