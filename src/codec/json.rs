//! JSON codec using `serde_json`.
//!
//! Events are exported one JSON object per line, ready for log shippers or
//! a parent process reading stdout.
//!
//! # Example
//!
//! ```
//! use sentinel_pubsub::codec::JsonCodec;
//! use sentinel_pubsub::payload::Endpoint;
//!
//! let endpoint = Endpoint { host: "127.0.0.1".to_string(), port: 6379 };
//! let line = JsonCodec::encode_line(&endpoint).unwrap();
//! assert_eq!(line, "{\"host\":\"127.0.0.1\",\"port\":6379}\n");
//! ```

use crate::error::Result;

/// JSON codec for exporting structured events.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    /// Encode a value to a single newline-terminated JSON line.
    #[inline]
    pub fn encode_line<T: serde::Serialize>(value: &T) -> Result<String> {
        let mut line = Self::encode(value)?;
        line.push('\n');
        Ok(line)
    }

    /// Encode a value to a `serde_json::Value` tree.
    #[inline]
    pub fn to_value<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(value)?)
    }
}
