//! # sentinel-pubsub
//!
//! Typed listener for Redis Sentinel pub/sub notifications.
//!
//! Sentinels announce topology changes (`+sdown`, `+odown`, `+switch-master`,
//! `+tilt`, ...) as plain-text messages on pub/sub channels. This crate keeps
//! a subscription session on one connection, classifies every reply frame and
//! decodes the payloads into structured records.
//!
//! ## Architecture
//!
//! - **Payload parsing** ([`payload`]): pure functions, one grammar per
//!   channel family
//! - **Session** ([`session`]): subscription bookkeeping and the
//!   frame-to-event dispatch
//! - **Transport** ([`transport`]): RESP over any tokio stream
//!
//! ## Example
//!
//! ```ignore
//! use sentinel_pubsub::{Event, Session, StreamTransport};
//!
//! #[tokio::main]
//! async fn main() -> sentinel_pubsub::Result<()> {
//!     let transport = StreamTransport::connect_tcp("127.0.0.1:26379").await?;
//!     let mut session = Session::builder().build(transport);
//!
//!     session.psubscribe(["*"]).await?;
//!     while session.is_active() {
//!         if let Event::Notification(n) = session.next_event().await? {
//!             println!("{} {:?}", n.channel, n.notification);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod event;
pub mod payload;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::{Result, SentinelError};
pub use event::{AckEvent, Event, Notification, NotificationEvent};
pub use payload::{InstanceInfo, MasterInfo, MasterPortPolicy, SwitchMaster};
pub use session::{Session, SessionBuilder, SessionState};
pub use transport::{StreamTransport, Transport};
