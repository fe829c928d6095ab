//! Subscription commands and the builder that produces them.
//!
//! The session never formats wire bytes itself: it asks a [`CommandBuilder`]
//! for a [`Command`] and hands that to the transport. The default
//! [`RespCommandBuilder`] is what a plain Redis Sentinel expects; a custom
//! builder can rename commands (e.g. for a proxy that prefixes them).

use std::collections::HashSet;
use std::fmt;

/// The four subscription methods a session can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `SUBSCRIBE channel [channel ...]`
    Subscribe,
    /// `PSUBSCRIBE pattern [pattern ...]`
    PSubscribe,
    /// `UNSUBSCRIBE [channel ...]`
    Unsubscribe,
    /// `PUNSUBSCRIBE [pattern ...]`
    PUnsubscribe,
}

impl Method {
    /// Command name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Subscribe => "SUBSCRIBE",
            Method::PSubscribe => "PSUBSCRIBE",
            Method::Unsubscribe => "UNSUBSCRIBE",
            Method::PUnsubscribe => "PUNSUBSCRIBE",
        }
    }

    /// Whether the method needs at least one argument.
    ///
    /// Unsubscribe methods without arguments drop every subscription.
    #[inline]
    pub fn requires_arguments(&self) -> bool {
        matches!(self, Method::Subscribe | Method::PSubscribe)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command ready to be written by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name (first element on the wire).
    pub name: String,
    /// Arguments in order.
    pub args: Vec<String>,
}

impl Command {
    /// Create a command.
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Turns a method plus arguments into a [`Command`].
pub trait CommandBuilder {
    /// Build the command for `method` with `args`.
    fn build(&self, method: Method, args: Vec<String>) -> Command;
}

/// Default builder: plain command names, duplicate arguments sent once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RespCommandBuilder;

impl CommandBuilder for RespCommandBuilder {
    fn build(&self, method: Method, args: Vec<String>) -> Command {
        Command::new(method.as_str(), dedup(args))
    }
}

/// Remove repeated arguments, keeping first occurrences in order.
fn dedup(mut args: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(args.len());
    args.retain(|arg| seen.insert(arg.clone()));
    args
}
