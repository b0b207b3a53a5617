//! Error types for registry operations and event delivery.

use thiserror::Error;

use agora_core::error::AppError;
use agora_core::types::ConnectionId;

/// Client-facing, recoverable failures of a registry or router operation.
///
/// Every variant is reported back to the originating connection as an
/// `error` event. None of them terminate the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    /// The operation referenced an identity that is not currently registered.
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
    /// `register` was called twice for the same identity.
    #[error("connection {0} is already registered")]
    DuplicateIdentity(ConnectionId),
    /// The frame was malformed, or the room or payload was missing.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    /// The sender is not a member of the target room.
    #[error("not a member of room '{0}'")]
    NotAMember(String),
}

impl RealtimeError {
    /// Stable machine-readable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownConnection(_) => "UNKNOWN_CONNECTION",
            Self::DuplicateIdentity(_) => "DUPLICATE_IDENTITY",
            Self::InvalidMessage(_) => "INVALID_MESSAGE",
            Self::NotAMember(_) => "NOT_A_MEMBER",
        }
    }

    /// Shorthand for an [`RealtimeError::InvalidMessage`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidMessage(reason.into())
    }
}

impl From<RealtimeError> for AppError {
    fn from(err: RealtimeError) -> Self {
        match &err {
            RealtimeError::UnknownConnection(_) => AppError::not_found(err.to_string()),
            RealtimeError::DuplicateIdentity(_) => AppError::conflict(err.to_string()),
            RealtimeError::InvalidMessage(_) | RealtimeError::NotAMember(_) => {
                AppError::validation(err.to_string())
            }
        }
    }
}

/// Failure to hand one event to one recipient's transport.
///
/// Delivery errors are logged and skipped during fan-out; they are never
/// surfaced to the sender and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No transport handle exists for the recipient.
    #[error("connection {0} has no open transport")]
    NotConnected(ConnectionId),
    /// The recipient's outbound queue is full.
    #[error("outbound queue for connection {0} is full")]
    QueueFull(ConnectionId),
    /// The recipient's transport has shut down.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
    /// The event could not be encoded.
    #[error("failed to encode event: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::error::ErrorKind;

    #[test]
    fn test_codes_are_stable() {
        let id = ConnectionId::new();
        assert_eq!(RealtimeError::UnknownConnection(id).code(), "UNKNOWN_CONNECTION");
        assert_eq!(RealtimeError::DuplicateIdentity(id).code(), "DUPLICATE_IDENTITY");
        assert_eq!(RealtimeError::invalid("missing room").code(), "INVALID_MESSAGE");
        assert_eq!(RealtimeError::NotAMember("topic1".into()).code(), "NOT_A_MEMBER");
    }

    #[test]
    fn test_maps_into_app_error_kinds() {
        let id = ConnectionId::new();
        assert_eq!(
            AppError::from(RealtimeError::UnknownConnection(id)).kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from(RealtimeError::DuplicateIdentity(id)).kind,
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from(RealtimeError::NotAMember("topic1".into())).kind,
            ErrorKind::Validation
        );
    }
}
