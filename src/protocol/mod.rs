//! Protocol module - RESP framing and frame types.
//!
//! This module implements the wire side of a pub/sub connection:
//! - Command encoding (array of bulk strings)
//! - Frame buffer for accumulating partial reads into complete replies
//! - Frame struct with typed accessors and the message kind tag

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{Field, Frame, MessageKind};
pub use frame_buffer::FrameBuffer;
pub use wire_format::{
    encode_command, encode_command_into, prefix, CRLF, DEFAULT_MAX_BULK_SIZE, MAX_FRAME_FIELDS,
};
