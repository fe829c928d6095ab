//! Typed events produced by a [`Session`](crate::session::Session).

use serde::Serialize;

use crate::error::Result;
use crate::payload::{
    parse_instance, parse_switch_master, InstanceInfo, MasterPortPolicy, NotificationKind,
    SwitchMaster,
};
use crate::protocol::MessageKind;

/// One event per received frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Subscribe/unsubscribe acknowledgement.
    Ack(AckEvent),
    /// Sentinel notification.
    Notification(NotificationEvent),
}

impl Event {
    /// Message kind of the frame this event came from.
    ///
    /// Notifications always report [`MessageKind::Message`], even when they
    /// arrived through a pattern subscription.
    pub fn kind(&self) -> MessageKind {
        match self {
            Event::Ack(ack) => ack.kind,
            Event::Notification(_) => MessageKind::Message,
        }
    }

    /// Channel the event refers to.
    pub fn channel(&self) -> &str {
        match self {
            Event::Ack(ack) => &ack.channel,
            Event::Notification(n) => &n.channel,
        }
    }

    /// The notification, if this is one.
    pub fn as_notification(&self) -> Option<&NotificationEvent> {
        match self {
            Event::Notification(n) => Some(n),
            Event::Ack(_) => None,
        }
    }
}

/// Acknowledgement of a subscribe-family command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AckEvent {
    /// Which command is acknowledged.
    pub kind: MessageKind,
    /// Channel or pattern the ack refers to.
    pub channel: String,
    /// Subscriptions still active on the connection after this command.
    pub count: i64,
}

/// A decoded sentinel notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEvent {
    /// Concrete channel the message was published on.
    pub channel: String,
    /// Pattern that matched, for messages received through `psubscribe`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Decoded payload.
    pub notification: Notification,
}

impl NotificationEvent {
    /// Decode `payload` according to the grammar `channel` selects.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::MalformedPayload`](crate::SentinelError::MalformedPayload)
    /// if the payload does not fit the grammar. No partial event is produced.
    pub fn decode(
        channel: &str,
        pattern: Option<&str>,
        payload: &str,
        policy: MasterPortPolicy,
    ) -> Result<Self> {
        let notification = match NotificationKind::resolve(channel) {
            NotificationKind::Tilt => Notification::Tilt,
            NotificationKind::SwitchMaster => {
                Notification::SwitchMaster(parse_switch_master(channel, payload)?)
            }
            NotificationKind::InstanceState => {
                Notification::InstanceState(parse_instance(channel, payload, policy)?)
            }
        };

        Ok(Self {
            channel: channel.to_string(),
            pattern: pattern.map(str::to_string),
            notification,
        })
    }

    /// Instance record, present for everything except tilt and switch-master.
    pub fn instance(&self) -> Option<&InstanceInfo> {
        match &self.notification {
            Notification::InstanceState(info) => Some(info),
            _ => None,
        }
    }

    /// Switch-master record, if this is one.
    pub fn switch_master(&self) -> Option<&SwitchMaster> {
        match &self.notification {
            Notification::SwitchMaster(switch) => Some(switch),
            _ => None,
        }
    }

    /// Whether this is a `+tilt` / `-tilt` marker.
    #[inline]
    pub fn is_tilt(&self) -> bool {
        matches!(self.notification, Notification::Tilt)
    }
}

/// Payload of a notification, one variant per grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "grammar", content = "data", rename_all = "snake_case")]
pub enum Notification {
    /// Tilt marker, no payload.
    Tilt,
    /// New master elected.
    SwitchMaster(SwitchMaster),
    /// Generic instance-state change.
    InstanceState(InstanceInfo),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SentinelError;

    fn decode(channel: &str, payload: &str) -> Result<NotificationEvent> {
        NotificationEvent::decode(channel, None, payload, MasterPortPolicy::default())
    }

    #[test]
    fn test_tilt_has_no_instance() {
        for channel in ["+tilt", "-tilt"] {
            let event = decode(channel, "garbage that would not parse").unwrap();
            assert!(event.is_tilt());
            assert!(event.instance().is_none());
            assert!(event.switch_master().is_none());
            assert_eq!(event.channel, channel);
        }
    }

    #[test]
    fn test_instance_state() {
        let event = decode("+sdown", "master mymaster 127.0.0.1 6379").unwrap();
        let info = event.instance().unwrap();
        assert_eq!(info.name, "mymaster");
        assert_eq!(info.port, 6379);
    }

    #[test]
    fn test_switch_master_uses_own_grammar() {
        let event = decode("+switch-master", "mymaster 10.0.0.1 6379 10.0.0.2 6379").unwrap();
        assert!(event.instance().is_none());
        let switch = event.switch_master().unwrap();
        assert_eq!(switch.old.host, "10.0.0.1");
        assert_eq!(switch.new.host, "10.0.0.2");
    }

    #[test]
    fn test_malformed_yields_no_event() {
        let err = decode("+sdown", "master mymaster 127.0.0.1").unwrap_err();
        assert!(matches!(err, SentinelError::MalformedPayload { .. }));
    }

    #[test]
    fn test_pattern_is_carried() {
        let event = NotificationEvent::decode(
            "-tilt",
            Some("*"),
            "",
            MasterPortPolicy::default(),
        )
        .unwrap();
        assert_eq!(event.pattern.as_deref(), Some("*"));
    }

    #[test]
    fn test_event_accessors() {
        let event = Event::Notification(decode("+tilt", "").unwrap());
        assert_eq!(event.kind(), MessageKind::Message);
        assert_eq!(event.channel(), "+tilt");
        assert!(event.as_notification().is_some());

        let ack = Event::Ack(AckEvent {
            kind: MessageKind::PUnsubscribe,
            channel: "*".to_string(),
            count: 0,
        });
        assert_eq!(ack.kind(), MessageKind::PUnsubscribe);
        assert!(ack.as_notification().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let event = Event::Notification(decode("+sdown", "master m 127.0.0.1 6379").unwrap());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "notification");
        assert_eq!(value["channel"], "+sdown");
        assert_eq!(value["notification"]["grammar"], "instance_state");
        assert_eq!(value["notification"]["data"]["type"], "master");
        assert!(value["notification"]["data"].get("master").is_none());
        assert!(value.get("pattern").is_none());
    }
}
