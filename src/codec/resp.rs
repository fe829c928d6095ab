//! RESP codec for subscription commands.

use bytes::{Bytes, BytesMut};

use crate::command::Command;
use crate::protocol::encode_command_into;

/// Encodes commands as RESP arrays of bulk strings.
pub struct RespCodec;

impl RespCodec {
    /// Encode a command into a fresh buffer.
    #[inline]
    pub fn encode(command: &Command) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::encoded_len_hint(command));
        Self::encode_into(command, &mut buf);
        buf.freeze()
    }

    /// Encode a command, appending to `buf`.
    #[inline]
    pub fn encode_into(command: &Command, buf: &mut BytesMut) {
        encode_command_into(buf, &command.name, &command.args);
    }

    /// Rough upper bound for the encoded size, used to size buffers.
    fn encoded_len_hint(command: &Command) -> usize {
        let payload: usize = command.args.iter().map(|a| a.len() + 16).sum();
        16 + command.name.len() + payload
    }
}
