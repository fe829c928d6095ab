//! Transport module - the duplex connection a session reads frames from.
//!
//! Provides:
//! - [`Transport`]: what a session needs from a connection
//! - [`StreamTransport`]: RESP over any tokio stream (TCP, Unix socket, in-memory duplex)
//! - [`CloseHandle`]: out-of-band close that wakes a blocked read

mod stream;

use std::future::Future;

use crate::command::Command;
use crate::error::Result;
use crate::protocol::Frame;

pub use stream::{CloseHandle, StreamTransport, TransportConfig, DEFAULT_READ_BUFFER_SIZE};

/// A duplex connection carrying commands out and deframed replies in.
///
/// A transport is owned by exactly one session; none of these methods are
/// called concurrently.
pub trait Transport: Send {
    /// Write one command.
    ///
    /// Fails with [`SentinelError::Io`](crate::SentinelError::Io) on write
    /// failure and [`SentinelError::Closed`](crate::SentinelError::Closed)
    /// after disconnect.
    fn write(&mut self, command: &Command) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next complete frame.
    ///
    /// Fails with [`SentinelError::Closed`](crate::SentinelError::Closed) when
    /// the peer closes the connection or the transport is closed out-of-band.
    fn read(&mut self) -> impl Future<Output = Result<Frame>> + Send;

    /// Close the connection. Calling it more than once is harmless.
    fn disconnect(&mut self) -> impl Future<Output = Result<()>> + Send;
}
