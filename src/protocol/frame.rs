//! Frame struct with typed accessors.
//!
//! A frame is one deframed pub/sub reply: an ordered list of fields whose
//! first element names the message kind. Field shapes per kind:
//!
//! | kind                                    | fields                         |
//! |-----------------------------------------|--------------------------------|
//! | `subscribe`, `psubscribe`, `unsubscribe`, `punsubscribe` | `kind, channel, count` |
//! | `message`                               | `kind, channel, payload`       |
//! | `pmessage`                              | `kind, pattern, channel, payload` |
//!
//! # Example
//!
//! ```
//! use sentinel_pubsub::protocol::{Field, Frame, MessageKind};
//!
//! let frame = Frame::new(vec![
//!     Field::bulk("subscribe"),
//!     Field::bulk("+switch-master"),
//!     Field::Integer(1),
//! ]);
//!
//! assert_eq!(frame.kind(), Some(MessageKind::Subscribe));
//! assert_eq!(frame.integer(2).unwrap(), 1);
//! ```

use std::fmt;

use bytes::Bytes;

use crate::error::{Result, SentinelError};

/// One element of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Bulk or simple string.
    Bulk(Bytes),
    /// Integer reply.
    Integer(i64),
    /// Null bulk string.
    Nil,
}

impl Field {
    /// Build a bulk field from a string slice (copies).
    pub fn bulk(s: &str) -> Self {
        Field::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// View the field as UTF-8 text, if it is a valid bulk string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// View the field as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Field::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Bulk(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Field::Integer(n) => write!(f, "{}", n),
            Field::Nil => write!(f, "(nil)"),
        }
    }
}

/// Kind tag carried in the first field of every pub/sub frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// `subscribe` acknowledgement.
    Subscribe,
    /// `psubscribe` acknowledgement.
    PSubscribe,
    /// `unsubscribe` acknowledgement.
    Unsubscribe,
    /// `punsubscribe` acknowledgement.
    PUnsubscribe,
    /// Message published on a subscribed channel.
    Message,
    /// Message published on a channel matching a subscribed pattern.
    PMessage,
}

impl MessageKind {
    /// Resolve a kind tag. Returns `None` for anything outside the six known kinds.
    pub fn from_field(field: &Field) -> Option<Self> {
        match field.as_str()? {
            "subscribe" => Some(MessageKind::Subscribe),
            "psubscribe" => Some(MessageKind::PSubscribe),
            "unsubscribe" => Some(MessageKind::Unsubscribe),
            "punsubscribe" => Some(MessageKind::PUnsubscribe),
            "message" => Some(MessageKind::Message),
            "pmessage" => Some(MessageKind::PMessage),
            _ => None,
        }
    }

    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Subscribe => "subscribe",
            MessageKind::PSubscribe => "psubscribe",
            MessageKind::Unsubscribe => "unsubscribe",
            MessageKind::PUnsubscribe => "punsubscribe",
            MessageKind::Message => "message",
            MessageKind::PMessage => "pmessage",
        }
    }

    /// Whether frames of this kind are subscription acknowledgements.
    #[inline]
    pub fn is_ack(&self) -> bool {
        matches!(
            self,
            MessageKind::Subscribe
                | MessageKind::PSubscribe
                | MessageKind::Unsubscribe
                | MessageKind::PUnsubscribe
        )
    }

    /// Number of fields a frame of this kind carries, kind tag included.
    #[inline]
    pub fn field_count(&self) -> usize {
        match self {
            MessageKind::PMessage => 4,
            _ => 3,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete deframed pub/sub reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Fields in wire order.
    pub fields: Vec<Field>,
}

impl Frame {
    /// Create a frame from its fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the frame has no fields at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw kind tag (first field).
    #[inline]
    pub fn tag(&self) -> Option<&Field> {
        self.fields.first()
    }

    /// Kind of this frame, if the tag is one of the known kinds.
    #[inline]
    pub fn kind(&self) -> Option<MessageKind> {
        self.tag().and_then(MessageKind::from_field)
    }

    /// Field at `index` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the field is missing or is not a UTF-8 string.
    pub fn text(&self, index: usize) -> Result<&str> {
        let field = self.field(index)?;
        field.as_str().ok_or_else(|| {
            SentinelError::Protocol(format!(
                "Expected a string at field {} of {} frame, got {}",
                index,
                self.tag_display(),
                field
            ))
        })
    }

    /// Field at `index` as an integer.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the field is missing or is not an integer.
    pub fn integer(&self, index: usize) -> Result<i64> {
        let field = self.field(index)?;
        field.as_integer().ok_or_else(|| {
            SentinelError::Protocol(format!(
                "Expected an integer at field {} of {} frame, got {}",
                index,
                self.tag_display(),
                field
            ))
        })
    }

    fn field(&self, index: usize) -> Result<&Field> {
        self.fields.get(index).ok_or_else(|| {
            SentinelError::Protocol(format!(
                "{} frame has {} fields, field {} is missing",
                self.tag_display(),
                self.fields.len(),
                index
            ))
        })
    }

    fn tag_display(&self) -> String {
        self.tag()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "empty".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(fields: &[Field]) -> Frame {
        Frame::new(fields.to_vec())
    }

    #[test]
    fn test_kind_resolution() {
        let cases = [
            ("subscribe", MessageKind::Subscribe),
            ("psubscribe", MessageKind::PSubscribe),
            ("unsubscribe", MessageKind::Unsubscribe),
            ("punsubscribe", MessageKind::PUnsubscribe),
            ("message", MessageKind::Message),
            ("pmessage", MessageKind::PMessage),
        ];
        for (tag, kind) in cases {
            assert_eq!(MessageKind::from_field(&Field::bulk(tag)), Some(kind));
            assert_eq!(kind.as_str(), tag);
        }
    }

    #[test]
    fn test_unknown_kinds() {
        assert_eq!(MessageKind::from_field(&Field::bulk("pong")), None);
        assert_eq!(MessageKind::from_field(&Field::bulk("MESSAGE")), None);
        assert_eq!(MessageKind::from_field(&Field::Integer(3)), None);
        assert_eq!(MessageKind::from_field(&Field::Nil), None);
    }

    #[test]
    fn test_ack_kinds() {
        assert!(MessageKind::Subscribe.is_ack());
        assert!(MessageKind::PUnsubscribe.is_ack());
        assert!(!MessageKind::Message.is_ack());
        assert!(!MessageKind::PMessage.is_ack());
        assert_eq!(MessageKind::PMessage.field_count(), 4);
        assert_eq!(MessageKind::Message.field_count(), 3);
    }

    #[test]
    fn test_typed_accessors() {
        let f = frame(&[
            Field::bulk("unsubscribe"),
            Field::bulk("chan"),
            Field::Integer(0),
        ]);
        assert_eq!(f.kind(), Some(MessageKind::Unsubscribe));
        assert_eq!(f.text(1).unwrap(), "chan");
        assert_eq!(f.integer(2).unwrap(), 0);
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn test_accessor_errors() {
        let f = frame(&[Field::bulk("message"), Field::Integer(5)]);
        assert!(matches!(f.text(1), Err(SentinelError::Protocol(_))));
        assert!(matches!(f.integer(0), Err(SentinelError::Protocol(_))));

        let err = f.text(2).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_non_utf8_is_not_text() {
        let f = frame(&[Field::Bulk(Bytes::from_static(&[0xff, 0xfe]))]);
        assert!(f.text(0).is_err());
        assert_eq!(f.kind(), None);
    }

    #[test]
    fn test_empty_frame() {
        let f = Frame::default();
        assert!(f.is_empty());
        assert_eq!(f.kind(), None);
        assert!(f.text(0).unwrap_err().to_string().contains("empty"));
    }
}
