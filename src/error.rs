//! Error types for sentinel-pubsub.

use thiserror::Error;

/// Main error type for all session, transport and parsing operations.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// I/O error while writing a command or reading a frame.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport was closed (EOF, explicit disconnect or out-of-band close).
    #[error("Connection closed")]
    Closed,

    /// Frame did not fit the pub/sub protocol (unknown kind, bad shape, bad RESP).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Notification payload did not match the grammar expected for its channel.
    #[error("Malformed payload on channel {channel}: {reason} (payload: {payload:?})")]
    MalformedPayload {
        /// Channel the notification arrived on.
        channel: String,
        /// Raw payload text, kept for diagnostics.
        payload: String,
        /// What was wrong with it.
        reason: String,
    },

    /// `next_event()` (or a subscribe call) after the subscription count dropped to zero.
    #[error("Session closed: no active subscriptions remain")]
    SessionClosed,

    /// JSON serialization error (event export only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SentinelError {
    /// Build a [`SentinelError::MalformedPayload`].
    pub(crate) fn malformed(channel: &str, payload: &str, reason: impl Into<String>) -> Self {
        SentinelError::MalformedPayload {
            channel: channel.to_string(),
            payload: payload.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error leaves the connection unusable.
    ///
    /// Malformed payloads are the only errors after which reading can continue.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SentinelError::MalformedPayload { .. })
    }
}

/// Result type alias using SentinelError.
pub type Result<T> = std::result::Result<T, SentinelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_includes_payload() {
        let err = SentinelError::malformed("+sdown", "master x", "missing port");
        let msg = err.to_string();
        assert!(msg.contains("+sdown"));
        assert!(msg.contains("master x"));
        assert!(msg.contains("missing port"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_io_error_is_fatal() {
        let err: SentinelError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(err.is_fatal());
        assert!(SentinelError::Closed.is_fatal());
    }
}
