//! Message validation rules.

use serde_json::Value;

use crate::error::RealtimeError;

/// Rejects frames that are empty or larger than `max_size` bytes.
pub fn validate_frame(raw: &str, max_size: usize) -> Result<(), RealtimeError> {
    if raw.len() > max_size {
        return Err(RealtimeError::invalid(format!(
            "frame exceeds maximum size of {max_size} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(RealtimeError::invalid("empty frame"));
    }

    Ok(())
}

/// Requires a room name to be present, non-empty, and at most `max_len` bytes.
///
/// Any other content is allowed: room names are chosen by clients.
pub fn require_room(room: Option<&str>, max_len: usize) -> Result<&str, RealtimeError> {
    let room = match room {
        Some(r) if !r.is_empty() => r,
        _ => return Err(RealtimeError::invalid("room is required")),
    };

    if room.len() > max_len {
        return Err(RealtimeError::invalid(format!(
            "room name exceeds {max_len} bytes"
        )));
    }

    Ok(room)
}

/// Requires a message payload to be present and non-empty.
///
/// Missing, `null`, `""`, `[]` and `{}` are empty. Scalars such as `0` and
/// `false` are real content and pass.
pub fn require_payload(payload: Option<&Value>) -> Result<&Value, RealtimeError> {
    let empty = match payload {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    };

    match payload {
        Some(p) if !empty => Ok(p),
        _ => Err(RealtimeError::invalid("message is required")),
    }
}
