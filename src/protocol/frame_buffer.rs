//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management. Bytes from the socket are
//! appended as they arrive; every complete top-level array (or RESP3 push)
//! is cut off the front and turned into a [`Frame`]. A frame that is still
//! incomplete stays buffered until the next push.
//!
//! # Example
//!
//! ```
//! use sentinel_pubsub::protocol::{FrameBuffer, MessageKind};
//!
//! let mut buffer = FrameBuffer::new();
//!
//! // Data arrives in chunks from the socket
//! assert!(buffer.push(b"*3\r\n$9\r\nsubscribe\r\n").unwrap().is_empty());
//! let frames = buffer.push(b"$4\r\nchan\r\n:1\r\n").unwrap();
//!
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].kind(), Some(MessageKind::Subscribe));
//! ```

use bytes::{Buf, Bytes, BytesMut};

use super::wire_format::{prefix, DEFAULT_MAX_BULK_SIZE, MAX_FRAME_FIELDS};
use super::{Field, Frame};
use crate::error::{Result, SentinelError};

/// Outcome of scanning the buffer for one frame.
enum Scan {
    /// Not enough bytes yet.
    Incomplete,
    /// A frame and the number of bytes it occupied.
    Complete(Frame, usize),
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Maximum allowed bulk string length.
    max_bulk_size: usize,
    /// Decode error hit after earlier frames in the same push succeeded.
    deferred: Option<SentinelError>,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 16KB, max bulk: 512MB.
    pub fn new() -> Self {
        Self::with_capacity_and_max_bulk(16 * 1024, DEFAULT_MAX_BULK_SIZE)
    }

    /// Create a new frame buffer with custom capacity and max bulk size.
    pub fn with_capacity_and_max_bulk(capacity: usize, max_bulk_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            max_bulk_size,
            deferred: None,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if the bytes are not valid RESP, if the server
    /// sent an error reply, or if a bulk string exceeds the configured limit.
    /// The buffer is cleared on error since its position can no longer be trusted.
    ///
    /// Frames completed before the bad bytes are still returned; the error is
    /// then held back and reported by [`take_error`](Self::take_error) or by
    /// the next `push`, so no decoded frame is lost.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }

        let mut frames = Vec::new();
        loop {
            match self.scan() {
                Ok(Scan::Complete(frame, consumed)) => {
                    self.buffer.advance(consumed);
                    frames.push(frame);
                }
                Ok(Scan::Incomplete) => return Ok(frames),
                Err(e) => {
                    self.buffer.clear();
                    if frames.is_empty() {
                        return Err(e);
                    }
                    self.deferred = Some(e);
                    return Ok(frames);
                }
            }
        }
    }

    /// Take the error held back by the last `push`, if any.
    pub fn take_error(&mut self) -> Option<SentinelError> {
        self.deferred.take()
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and drop any held-back error.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.deferred = None;
    }

    fn scan(&self) -> Result<Scan> {
        let buf = &self.buffer[..];
        if buf.is_empty() {
            return Ok(Scan::Incomplete);
        }

        match buf[0] {
            prefix::ARRAY | prefix::PUSH => {}
            prefix::ERROR => {
                return match read_line(buf, 1) {
                    Some((line, _)) => Err(SentinelError::Protocol(format!(
                        "Server replied with an error: {}",
                        String::from_utf8_lossy(line)
                    ))),
                    None => Ok(Scan::Incomplete),
                };
            }
            other => {
                return Err(SentinelError::Protocol(format!(
                    "Expected an array reply in pub/sub context, got type byte {:?}",
                    other as char
                )));
            }
        }

        let (count, mut pos) = match read_line(buf, 1) {
            Some((line, next)) => (parse_int(line)?, next),
            None => return Ok(Scan::Incomplete),
        };
        if count < 0 {
            return Err(SentinelError::Protocol(
                "Null array in pub/sub context".to_string(),
            ));
        }
        let count = count as usize;
        if count > MAX_FRAME_FIELDS {
            return Err(SentinelError::Protocol(format!(
                "Frame has {} fields, maximum is {}",
                count, MAX_FRAME_FIELDS
            )));
        }

        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            match self.scan_field(buf, pos)? {
                Some((field, next)) => {
                    fields.push(field);
                    pos = next;
                }
                None => return Ok(Scan::Incomplete),
            }
        }

        Ok(Scan::Complete(Frame::new(fields), pos))
    }

    /// Scan one array element starting at `pos`.
    fn scan_field(&self, buf: &[u8], pos: usize) -> Result<Option<(Field, usize)>> {
        let Some(&type_byte) = buf.get(pos) else {
            return Ok(None);
        };
        let Some((line, after_line)) = read_line(buf, pos + 1) else {
            return Ok(None);
        };

        match type_byte {
            prefix::BULK_STRING => {
                let len = parse_int(line)?;
                if len < 0 {
                    return Ok(Some((Field::Nil, after_line)));
                }
                let len = len as usize;
                if len > self.max_bulk_size {
                    return Err(SentinelError::Protocol(format!(
                        "Bulk string of {} bytes exceeds maximum {}",
                        len, self.max_bulk_size
                    )));
                }
                let end = after_line + len;
                if buf.len() < end + 2 {
                    return Ok(None);
                }
                if &buf[end..end + 2] != b"\r\n" {
                    return Err(SentinelError::Protocol(
                        "Bulk string not terminated by CRLF".to_string(),
                    ));
                }
                let data = Bytes::copy_from_slice(&buf[after_line..end]);
                Ok(Some((Field::Bulk(data), end + 2)))
            }
            prefix::SIMPLE_STRING => Ok(Some((
                Field::Bulk(Bytes::copy_from_slice(line)),
                after_line,
            ))),
            prefix::INTEGER => Ok(Some((Field::Integer(parse_int(line)?), after_line))),
            prefix::NULL => Ok(Some((Field::Nil, after_line))),
            prefix::ARRAY | prefix::PUSH => Err(SentinelError::Protocol(
                "Nested arrays are not expected in pub/sub frames".to_string(),
            )),
            other => Err(SentinelError::Protocol(format!(
                "Unsupported RESP type byte {:?} inside frame",
                other as char
            ))),
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the CRLF-terminated line starting at `start`.
///
/// Returns the line (without CRLF) and the offset just past the CRLF.
fn read_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(start..)?;
    let end = rest.windows(2).position(|w| w == b"\r\n")?;
    Some((&rest[..end], start + end + 2))
}

fn parse_int(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            SentinelError::Protocol(format!(
                "Invalid integer in RESP header: {:?}",
                String::from_utf8_lossy(line)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageKind;

    const MESSAGE: &[u8] =
        b"*3\r\n$7\r\nmessage\r\n$6\r\n+sdown\r\n$30\r\nmaster mymaster 127.0.0.1 6379\r\n";

    #[test]
    fn test_single_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(MESSAGE).unwrap();

        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.kind(), Some(MessageKind::Message));
        assert_eq!(frame.text(1).unwrap(), "+sdown");
        assert_eq!(frame.text(2).unwrap(), "master mymaster 127.0.0.1 6379");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_integer_field() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(b"*3\r\n$11\r\nunsubscribe\r\n$4\r\nchan\r\n:0\r\n")
            .unwrap();

        assert_eq!(frames[0].integer(2).unwrap(), 0);
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"*3\r\n$9\r\nsubscribe\r\n$1\r\na\r\n:1\r\n");
        bytes.extend_from_slice(b"*3\r\n$9\r\nsubscribe\r\n$1\r\nb\r\n:2\r\n");
        bytes.extend_from_slice(MESSAGE);

        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].integer(2).unwrap(), 2);
        assert_eq!(frames[2].kind(), Some(MessageKind::Message));
    }

    #[test]
    fn test_fragmented_byte_by_byte() {
        let mut buffer = FrameBuffer::new();
        let mut frames = Vec::new();

        for byte in MESSAGE {
            frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text(1).unwrap(), "+sdown");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_frame_stays_buffered() {
        let mut buffer = FrameBuffer::new();
        let split = MESSAGE.len() - 5;

        assert!(buffer.push(&MESSAGE[..split]).unwrap().is_empty());
        assert_eq!(buffer.len(), split);

        let frames = buffer.push(&MESSAGE[split..]).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_pmessage_four_fields() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(b"*4\r\n$8\r\npmessage\r\n$1\r\n*\r\n$5\r\n+tilt\r\n$0\r\n\r\n")
            .unwrap();

        let frame = &frames[0];
        assert_eq!(frame.kind(), Some(MessageKind::PMessage));
        assert_eq!(frame.text(1).unwrap(), "*");
        assert_eq!(frame.text(2).unwrap(), "+tilt");
        assert_eq!(frame.text(3).unwrap(), "");
    }

    #[test]
    fn test_resp3_push_and_simple_string() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(b">3\r\n+subscribe\r\n+chan\r\n:1\r\n")
            .unwrap();

        assert_eq!(frames[0].kind(), Some(MessageKind::Subscribe));
        assert_eq!(frames[0].text(1).unwrap(), "chan");
    }

    #[test]
    fn test_null_bulk() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(b"*3\r\n$11\r\nunsubscribe\r\n$-1\r\n:0\r\n")
            .unwrap();

        assert_eq!(frames[0].fields[1], Field::Nil);
    }

    #[test]
    fn test_error_reply() {
        let mut buffer = FrameBuffer::new();
        let err = buffer
            .push(b"-ERR unknown command 'SUBSCRIBE'\r\n")
            .unwrap_err();

        assert!(matches!(err, SentinelError::Protocol(_)));
        assert!(err.to_string().contains("unknown command"));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_frames_before_error_are_kept() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(b"*3\r\n$11\r\nunsubscribe\r\n$1\r\na\r\n:0\r\n-ERR boom\r\n")
            .unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind(), Some(MessageKind::Unsubscribe));
        assert_eq!(frames[0].integer(2).unwrap(), 0);
        assert!(buffer.is_empty());

        let err = buffer.take_error().unwrap();
        assert!(err.to_string().contains("ERR boom"));
        assert!(buffer.take_error().is_none());
    }

    #[test]
    fn test_held_back_error_reported_by_next_push() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(b"*3\r\n$9\r\nsubscribe\r\n$1\r\na\r\n:1\r\n:oops\r\n")
            .unwrap();
        assert_eq!(frames.len(), 1);

        assert!(buffer.push(MESSAGE).is_err());
        // Bytes pushed alongside the reported error are decoded afterwards.
        let frames = buffer.push(b"").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind(), Some(MessageKind::Message));
    }

    #[test]
    fn test_incomplete_error_reply_waits() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"-ERR partial").unwrap().is_empty());
    }

    #[test]
    fn test_unexpected_top_level_type() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b":1\r\n").is_err());
    }

    #[test]
    fn test_nested_array_rejected() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"*1\r\n*0\r\n").is_err());
    }

    #[test]
    fn test_bulk_size_limit() {
        let mut buffer = FrameBuffer::with_capacity_and_max_bulk(64, 4);
        let err = buffer.push(b"*1\r\n$5\r\nhello\r\n").unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_bad_bulk_terminator() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"*1\r\n$2\r\nabXY").is_err());
    }

    #[test]
    fn test_invalid_length() {
        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(b"*x\r\n").is_err());
    }
}
