//! RESP wire format constants and command encoding.
//!
//! Commands are always sent as an array of bulk strings:
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<arg>\r\n   (repeated argc times)
//! ```
//!
//! Replies in a pub/sub context are arrays (`*`, or `>` pushes on RESP3)
//! whose elements are bulk strings, simple strings, integers or nulls.

use bytes::{BufMut, Bytes, BytesMut};

/// Line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// Default maximum bulk string size (512 MB, same limit the server enforces).
pub const DEFAULT_MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements accepted in one frame.
///
/// Pub/sub frames carry at most four fields; anything far larger is garbage.
pub const MAX_FRAME_FIELDS: usize = 1024;

/// Type prefixes.
pub mod prefix {
    /// `+OK\r\n`
    pub const SIMPLE_STRING: u8 = b'+';
    /// `-ERR message\r\n`
    pub const ERROR: u8 = b'-';
    /// `:1000\r\n`
    pub const INTEGER: u8 = b':';
    /// `$5\r\nhello\r\n`
    pub const BULK_STRING: u8 = b'$';
    /// `*2\r\n...`
    pub const ARRAY: u8 = b'*';
    /// RESP3 out-of-band push: `>3\r\n...`
    pub const PUSH: u8 = b'>';
    /// RESP3 null: `_\r\n`
    pub const NULL: u8 = b'_';
}

/// Encode a command (name followed by arguments) into a fresh buffer.
///
/// # Example
///
/// ```
/// use sentinel_pubsub::protocol::encode_command;
///
/// let bytes = encode_command("SUBSCRIBE", &["+switch-master"]);
/// assert_eq!(&bytes[..], b"*2\r\n$9\r\nSUBSCRIBE\r\n$14\r\n+switch-master\r\n");
/// ```
pub fn encode_command<S: AsRef<str>>(name: &str, args: &[S]) -> Bytes {
    let mut buf = BytesMut::with_capacity(16 + name.len() + args.len() * 24);
    encode_command_into(&mut buf, name, args);
    buf.freeze()
}

/// Encode a command into an existing buffer.
pub fn encode_command_into<S: AsRef<str>>(buf: &mut BytesMut, name: &str, args: &[S]) {
    write_header(buf, prefix::ARRAY, args.len() + 1);
    write_bulk(buf, name.as_bytes());
    for arg in args {
        write_bulk(buf, arg.as_ref().as_bytes());
    }
}

#[inline]
fn write_header(buf: &mut BytesMut, prefix: u8, len: usize) {
    buf.put_u8(prefix);
    buf.put_slice(len.to_string().as_bytes());
    buf.put_slice(CRLF);
}

#[inline]
fn write_bulk(buf: &mut BytesMut, data: &[u8]) {
    write_header(buf, prefix::BULK_STRING, data.len());
    buf.put_slice(data);
    buf.put_slice(CRLF);
}
