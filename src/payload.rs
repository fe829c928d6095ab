//! Sentinel notification payload parsing.
//!
//! Sentinel publishes plain-text, space-delimited payloads. Which grammar a
//! payload follows depends only on the channel it arrived on, so the channel
//! is resolved once into a [`NotificationKind`] and the matching parser runs:
//!
//! ```text
//! +tilt / -tilt       (no payload decode)
//! switch-master       <master-name> <old-host> <old-port> <new-host> <new-port>
//! anything else       <type> <name> <host> <port> [[@] <master-name> <master-host> <master-port>]
//! ```
//!
//! The master description after `<port>` is required when `<type>` is not
//! `master`. Real sentinels put an `@` in front of it; it is accepted and
//! skipped.
//!
//! # Example
//!
//! ```
//! use sentinel_pubsub::payload::{parse_instance, MasterPortPolicy};
//!
//! let info = parse_instance(
//!     "+sdown",
//!     "slave replica1 10.0.0.2 6380 mymaster 127.0.0.1 6379",
//!     MasterPortPolicy::default(),
//! )
//! .unwrap();
//!
//! let master = info.master.unwrap();
//! assert_eq!(master.name, "mymaster");
//! assert_eq!(master.port, 6380); // reuses the instance port, see MasterPortPolicy
//! ```

use serde::Serialize;

use crate::error::{Result, SentinelError};

/// Role label that marks an instance as a master.
pub const MASTER_ROLE: &str = "master";

/// Channel names with special grammars.
pub mod channels {
    /// Sentinel entered tilt mode.
    pub const TILT_ON: &str = "+tilt";
    /// Sentinel left tilt mode.
    pub const TILT_OFF: &str = "-tilt";
    /// A new master was elected.
    pub const SWITCH_MASTER: &str = "switch-master";
    /// Name real sentinels publish the switch on.
    pub const SWITCH_MASTER_PLUS: &str = "+switch-master";
}

/// Grammar selected by a channel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// `+tilt` / `-tilt`: no payload.
    Tilt,
    /// `switch-master`: old and new master endpoints.
    SwitchMaster,
    /// Everything else: generic instance-state layout.
    InstanceState,
}

impl NotificationKind {
    /// Resolve the grammar for a channel.
    pub fn resolve(channel: &str) -> Self {
        match channel {
            channels::TILT_ON | channels::TILT_OFF => NotificationKind::Tilt,
            channels::SWITCH_MASTER | channels::SWITCH_MASTER_PLUS => {
                NotificationKind::SwitchMaster
            }
            _ => NotificationKind::InstanceState,
        }
    }
}

/// Where the nested master record takes its port from.
///
/// Existing consumers expect the nested master record to carry the
/// *instance's* port, not the port announced for the master, so that is the
/// default. `FromPayload` uses the announced master port instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterPortPolicy {
    /// Nested `master.port` equals the outer instance port.
    #[default]
    ReuseInstancePort,
    /// Nested `master.port` is the port parsed from the master description.
    FromPayload,
}

/// A host/port pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// Host or IP as announced.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Master an instance reports to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MasterInfo {
    /// Master name as configured in the sentinel.
    pub name: String,
    /// Master host.
    pub host: String,
    /// Master port (see [`MasterPortPolicy`]).
    pub port: u16,
}

/// Decoded generic instance-state payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    /// Role label (`master`, `slave`, `sentinel`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Instance name.
    pub name: String,
    /// Instance host.
    pub host: String,
    /// Instance port.
    pub port: u16,
    /// Present when the instance is not itself a master.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<MasterInfo>,
}

impl InstanceInfo {
    /// Whether the instance itself is a master.
    #[inline]
    pub fn is_master(&self) -> bool {
        self.kind == MASTER_ROLE
    }
}

/// Decoded `switch-master` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchMaster {
    /// Name of the master that changed address.
    pub name: String,
    /// Previous master address.
    pub old: Endpoint,
    /// Newly elected master address.
    pub new: Endpoint,
}

/// Parse a generic instance-state payload.
///
/// # Errors
///
/// Returns [`SentinelError::MalformedPayload`] when fields are missing or a
/// port is not a valid port number.
pub fn parse_instance(
    channel: &str,
    payload: &str,
    policy: MasterPortPolicy,
) -> Result<InstanceInfo> {
    let mut fields = payload.splitn(5, ' ');
    let mut next = |what: &str| {
        fields
            .next()
            .ok_or_else(|| SentinelError::malformed(channel, payload, format!("missing {}", what)))
    };

    let kind = next("instance type")?;
    let name = next("instance name")?;
    let host = next("instance host")?;
    let port = parse_port(channel, payload, next("instance port")?)?;

    let master = if kind == MASTER_ROLE {
        None
    } else {
        let description = next("master description")?;
        Some(parse_master(channel, payload, description, port, policy)?)
    };

    Ok(InstanceInfo {
        kind: kind.to_string(),
        name: name.to_string(),
        host: host.to_string(),
        port,
        master,
    })
}

/// Parse the nested `[@] <name> <host> <port>` master description.
fn parse_master(
    channel: &str,
    payload: &str,
    description: &str,
    instance_port: u16,
    policy: MasterPortPolicy,
) -> Result<MasterInfo> {
    let description = description.strip_prefix("@ ").unwrap_or(description);
    // Anything after the master port is ignored, as for master instances.
    let mut parts = description.split(' ');
    let (Some(name), Some(host), Some(announced_port)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(SentinelError::malformed(
            channel,
            payload,
            format!(
                "master description needs 3 fields, got {}",
                description.split(' ').count()
            ),
        ));
    };

    let port = match policy {
        MasterPortPolicy::ReuseInstancePort => instance_port,
        MasterPortPolicy::FromPayload => parse_port(channel, payload, announced_port)?,
    };

    Ok(MasterInfo {
        name: name.to_string(),
        host: host.to_string(),
        port,
    })
}

/// Parse a `switch-master` payload.
///
/// # Errors
///
/// Returns [`SentinelError::MalformedPayload`] unless the payload has exactly
/// five fields with numeric ports.
pub fn parse_switch_master(channel: &str, payload: &str) -> Result<SwitchMaster> {
    let parts: Vec<&str> = payload.split(' ').collect();
    let [name, old_host, old_port, new_host, new_port] = parts[..] else {
        return Err(SentinelError::malformed(
            channel,
            payload,
            format!("switch-master needs 5 fields, got {}", parts.len()),
        ));
    };

    Ok(SwitchMaster {
        name: name.to_string(),
        old: Endpoint {
            host: old_host.to_string(),
            port: parse_port(channel, payload, old_port)?,
        },
        new: Endpoint {
            host: new_host.to_string(),
            port: parse_port(channel, payload, new_port)?,
        },
    })
}

fn parse_port(channel: &str, payload: &str, raw: &str) -> Result<u16> {
    raw.parse::<u16>().map_err(|_| {
        SentinelError::malformed(channel, payload, format!("invalid port {:?}", raw))
    })
}
