//! Codec module - encoding of outgoing commands and exported events.
//!
//! - [`RespCodec`] - [`Command`](crate::command::Command) to RESP wire bytes
//! - [`JsonCodec`] - events (or any `Serialize` value) to JSON via `serde_json`
//!
//! # Design
//!
//! Codecs are implemented as marker structs with static methods rather than trait objects.
//!
//! # Example
//!
//! ```
//! use sentinel_pubsub::codec::RespCodec;
//! use sentinel_pubsub::command::Command;
//!
//! let cmd = Command::new("SUBSCRIBE", vec!["+tilt".to_string()]);
//! assert_eq!(&RespCodec::encode(&cmd)[..], b"*2\r\n$9\r\nSUBSCRIBE\r\n$5\r\n+tilt\r\n");
//! ```

mod json;
mod resp;

pub use json::JsonCodec;
pub use resp::RespCodec;
