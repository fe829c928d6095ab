//! Subscription session and its builder.
//!
//! A [`Session`] owns one transport and turns the frames it yields into
//! [`Event`]s. Lifecycle:
//! 1. Build the session around a connected transport
//! 2. Issue `subscribe` / `psubscribe`
//! 3. Call `next_event()` (or `listen()`) until the session ends
//!
//! The session ends when an acknowledgement reports that no subscriptions
//! are left on the connection. There is no way back from `Ended`; start a
//! new session instead.
//!
//! # Example
//!
//! ```ignore
//! use sentinel_pubsub::{Session, StreamTransport};
//!
//! let transport = StreamTransport::connect_tcp("127.0.0.1:26379").await?;
//! let mut session = Session::builder().build(transport);
//!
//! session.subscribe(["+switch-master", "+tilt", "-tilt"]).await?;
//! while session.is_active() {
//!     let event = session.next_event().await?;
//!     println!("{:?}", event);
//! }
//! ```

use std::ops::ControlFlow;

use crate::command::{CommandBuilder, Method, RespCommandBuilder};
use crate::error::{Result, SentinelError};
use crate::event::{AckEvent, Event, NotificationEvent};
use crate::payload::MasterPortPolicy;
use crate::protocol::{Field, Frame, MessageKind};
use crate::transport::Transport;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Frames may still arrive.
    Active,
    /// The subscription count dropped to zero (or the session was aborted).
    Ended,
}

/// Builder for configuring and creating a [`Session`].
pub struct SessionBuilder<B = RespCommandBuilder> {
    commands: B,
    master_port_policy: MasterPortPolicy,
}

impl SessionBuilder {
    /// Create a builder with the default command builder and port policy.
    pub fn new() -> Self {
        Self {
            commands: RespCommandBuilder,
            master_port_policy: MasterPortPolicy::default(),
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CommandBuilder> SessionBuilder<B> {
    /// Use a custom command builder.
    pub fn command_builder<C: CommandBuilder>(self, commands: C) -> SessionBuilder<C> {
        SessionBuilder {
            commands,
            master_port_policy: self.master_port_policy,
        }
    }

    /// Choose where nested master records take their port from.
    ///
    /// Default: [`MasterPortPolicy::ReuseInstancePort`].
    pub fn master_port_policy(mut self, policy: MasterPortPolicy) -> Self {
        self.master_port_policy = policy;
        self
    }

    /// Build the session around a connected transport.
    pub fn build<T: Transport>(self, transport: T) -> Session<T, B> {
        Session {
            transport,
            commands: self.commands,
            master_port_policy: self.master_port_policy,
            state: SessionState::Active,
            subscription_count: 0,
            subscribed: false,
            psubscribed: false,
        }
    }
}

/// A pub/sub session over a single transport.
///
/// All methods take `&mut self`: commands and reads are serialized by the
/// owner, and nothing else may read from the transport.
pub struct Session<T, B = RespCommandBuilder> {
    transport: T,
    commands: B,
    master_port_policy: MasterPortPolicy,
    state: SessionState,
    /// Count reported by the most recent acknowledgement.
    subscription_count: i64,
    subscribed: bool,
    psubscribed: bool,
}

impl Session<(), RespCommandBuilder> {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }
}

impl<T: Transport, B: CommandBuilder> Session<T, B> {
    /// Subscribe to one or more channels.
    ///
    /// # Errors
    ///
    /// `SessionClosed` once ended, `Protocol` for an empty channel set, and
    /// any transport write error.
    pub async fn subscribe<I, S>(&mut self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Method::Subscribe, collect(channels)).await?;
        self.subscribed = true;
        Ok(())
    }

    /// Subscribe to one or more channel patterns.
    pub async fn psubscribe<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Method::PSubscribe, collect(patterns)).await?;
        self.psubscribed = true;
        Ok(())
    }

    /// Unsubscribe from channels; an empty set drops every channel subscription.
    pub async fn unsubscribe<I, S>(&mut self, channels: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Method::Unsubscribe, collect(channels)).await
    }

    /// Unsubscribe from patterns; an empty set drops every pattern subscription.
    pub async fn punsubscribe<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Method::PUnsubscribe, collect(patterns)).await
    }

    async fn send(&mut self, method: Method, args: Vec<String>) -> Result<()> {
        self.ensure_active()?;
        if method.requires_arguments() && args.is_empty() {
            return Err(SentinelError::Protocol(format!(
                "{} needs at least one channel",
                method
            )));
        }

        let command = self.commands.build(method, args);
        tracing::debug!("Sending {}", command);
        self.transport.write(&command).await
    }

    /// Wait for the next frame and turn it into an event.
    ///
    /// # Errors
    ///
    /// - `SessionClosed` if the session already ended
    /// - `Protocol` for frames outside the six pub/sub kinds or with a bad shape
    /// - `MalformedPayload` for notifications that do not parse (the session
    ///   stays usable)
    /// - `Io` / `Closed` from the transport
    pub async fn next_event(&mut self) -> Result<Event> {
        self.ensure_active()?;
        let frame = self.transport.read().await?;
        tracing::trace!("Received frame with {} fields", frame.len());
        self.dispatch(&frame)
    }

    fn dispatch(&mut self, frame: &Frame) -> Result<Event> {
        let Some(kind) = frame.kind() else {
            let tag = frame
                .tag()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "(none)".to_string());
            tracing::warn!("Unexpected message kind {} in pub/sub context", tag);
            return Err(SentinelError::Protocol(format!(
                "Received an unknown message type {} inside of a pubsub context",
                tag
            )));
        };

        if frame.len() != kind.field_count() {
            return Err(SentinelError::Protocol(format!(
                "{} frame must have {} fields, got {}",
                kind,
                kind.field_count(),
                frame.len()
            )));
        }

        if kind.is_ack() {
            let channel = ack_channel(frame)?;
            let count = frame.integer(2)?;
            self.record_ack(count);
            return Ok(Event::Ack(AckEvent {
                kind,
                channel,
                count,
            }));
        }

        match kind {
            MessageKind::PMessage => {
                self.notification(Some(frame.text(1)?), frame.text(2)?, frame.text(3)?)
            }
            _ => self.notification(None, frame.text(1)?, frame.text(2)?),
        }
    }

    /// The only place the subscription count and state change.
    fn record_ack(&mut self, count: i64) {
        self.subscription_count = count;
        if count == 0 {
            tracing::debug!("No subscriptions left, session ended");
            self.invalidate();
        }
    }

    fn notification(&self, pattern: Option<&str>, channel: &str, payload: &str) -> Result<Event> {
        NotificationEvent::decode(channel, pattern, payload, self.master_port_policy)
            .map(Event::Notification)
    }

    /// Read events until the session ends or `on_event` breaks.
    ///
    /// Returns `Ok(())` in both cases; errors stop the loop and are returned.
    pub async fn listen<F>(&mut self, mut on_event: F) -> Result<()>
    where
        F: FnMut(Event) -> ControlFlow<()>,
    {
        while self.is_active() {
            let event = self.next_event().await?;
            if on_event(event).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Ask the server to drop every subscription this session made.
    ///
    /// Acknowledgements still have to be read with `next_event()`; the
    /// session ends when the last one reports a count of zero. Returns
    /// whether the session has already ended.
    pub async fn close(&mut self) -> Result<bool> {
        if self.is_active() {
            if self.subscribed {
                self.send(Method::Unsubscribe, Vec::new()).await?;
            }
            if self.psubscribed {
                self.send(Method::PUnsubscribe, Vec::new()).await?;
            }
        }
        Ok(!self.is_active())
    }

    /// End the session immediately and disconnect, without unsubscribing.
    pub async fn abort(&mut self) -> Result<()> {
        self.invalidate();
        self.disconnect().await
    }

    /// Close the transport. Valid in any state and does not change it.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.transport.disconnect().await
    }

    fn invalidate(&mut self) {
        self.state = SessionState::Ended;
        self.subscribed = false;
        self.psubscribed = false;
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Ended => Err(SentinelError::SessionClosed),
        }
    }
}

impl<T, B> Session<T, B> {
    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether `next_event()` may still be called.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Subscription count from the most recent acknowledgement (0 before any).
    #[inline]
    pub fn subscription_count(&self) -> i64 {
        self.subscription_count
    }

    /// Whether `subscribe` was issued on this session.
    #[inline]
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Whether `psubscribe` was issued on this session.
    #[inline]
    pub fn is_psubscribed(&self) -> bool {
        self.psubscribed
    }

    /// The owned transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Give the transport back, dropping the session.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

fn collect<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

/// Channel of an acknowledgement; the server sends nil when unsubscribing
/// with nothing subscribed.
fn ack_channel(frame: &Frame) -> Result<String> {
    match frame.fields.get(1) {
        Some(Field::Nil) => Ok(String::new()),
        _ => frame.text(1).map(str::to_string),
    }
}
