//! RESP transport over a tokio byte stream.
//!
//! # Example
//!
//! ```ignore
//! use sentinel_pubsub::transport::StreamTransport;
//!
//! let transport = StreamTransport::connect_tcp("127.0.0.1:26379").await?;
//! let closer = transport.close_handle();
//!
//! // From another task: wake the reader and end the session.
//! closer.close();
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Notify;

use super::Transport;
use crate::codec::RespCodec;
use crate::command::Command;
use crate::error::{Result, SentinelError};
use crate::protocol::{Frame, FrameBuffer, DEFAULT_MAX_BULK_SIZE};

/// Default size of the socket read buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

/// Configuration for a [`StreamTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Bytes requested from the socket per read.
    pub read_buffer_size: usize,
    /// Largest bulk string accepted in a frame.
    pub max_bulk_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_bulk_size: DEFAULT_MAX_BULK_SIZE,
        }
    }
}

#[derive(Debug, Default)]
struct CloseState {
    closed: AtomicBool,
    notify: Notify,
}

/// Closes a [`StreamTransport`] from outside the task that owns it.
///
/// Cheaply cloneable. A read blocked at the time of `close()`, and every
/// later read or write, fails with [`SentinelError::Closed`].
#[derive(Debug, Clone, Default)]
pub struct CloseHandle {
    state: Arc<CloseState>,
}

impl CloseHandle {
    /// Request the transport to close.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    /// Whether `close()` has been called.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }
}

/// RESP transport over any `AsyncRead + AsyncWrite` stream.
pub struct StreamTransport<S> {
    /// `None` once disconnected.
    stream: Option<S>,
    /// Partial reply bytes.
    buffer: FrameBuffer,
    /// Frames decoded but not yet handed out.
    pending: VecDeque<Frame>,
    read_buf: Vec<u8>,
    write_buf: BytesMut,
    closer: CloseHandle,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream with default settings.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, TransportConfig::default())
    }

    /// Wrap a connected stream.
    pub fn with_config(stream: S, config: TransportConfig) -> Self {
        Self {
            stream: Some(stream),
            buffer: FrameBuffer::with_capacity_and_max_bulk(
                config.read_buffer_size,
                config.max_bulk_size,
            ),
            pending: VecDeque::new(),
            read_buf: vec![0u8; config.read_buffer_size.max(1)],
            write_buf: BytesMut::with_capacity(256),
            closer: CloseHandle::default(),
        }
    }

    /// Handle for closing this transport from another task.
    pub fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }

    /// Whether the underlying stream is still held.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some() && !self.closer.is_closed()
    }

    async fn shutdown(&mut self) {
        self.pending.clear();
        self.buffer.clear();
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!("Ignoring error while shutting down stream: {}", e);
            }
        }
    }
}

impl StreamTransport<TcpStream> {
    /// Connect to a sentinel over TCP.
    pub async fn connect_tcp<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

#[cfg(unix)]
impl StreamTransport<tokio::net::UnixStream> {
    /// Connect to a sentinel over a Unix domain socket.
    pub async fn connect_unix<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let stream = tokio::net::UnixStream::connect(path).await?;
        Ok(Self::new(stream))
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, command: &Command) -> Result<()> {
        if self.closer.is_closed() {
            self.shutdown().await;
            return Err(SentinelError::Closed);
        }
        let stream = self.stream.as_mut().ok_or(SentinelError::Closed)?;

        self.write_buf.clear();
        RespCodec::encode_into(command, &mut self.write_buf);
        stream.write_all(&self.write_buf).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }
            if let Some(e) = self.buffer.take_error() {
                tracing::warn!("Failed to decode reply: {}", e);
                return Err(e);
            }

            let closer = self.closer.clone();
            let notified = closer.state.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a close() in between is not missed.
            notified.as_mut().enable();

            if closer.is_closed() {
                self.shutdown().await;
                return Err(SentinelError::Closed);
            }
            let stream = self.stream.as_mut().ok_or(SentinelError::Closed)?;

            let outcome = tokio::select! {
                _ = &mut notified => None,
                res = stream.read(&mut self.read_buf) => Some(res),
            };

            let n = match outcome {
                None => {
                    tracing::debug!("Transport closed while waiting for a frame");
                    self.shutdown().await;
                    return Err(SentinelError::Closed);
                }
                Some(Ok(0)) => {
                    tracing::debug!("Peer closed the connection");
                    self.shutdown().await;
                    return Err(SentinelError::Closed);
                }
                Some(Ok(n)) => n,
                Some(Err(e)) => return Err(SentinelError::Io(e)),
            };

            match self.buffer.push(&self.read_buf[..n]) {
                Ok(frames) => self.pending.extend(frames),
                Err(e) => {
                    tracing::warn!("Failed to decode reply: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.shutdown().await;
        Ok(())
    }
}
