// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed node events.
//!
//! Inbound [`Event`]s addressed to a node are parsed into a [`NodeEvent`]
//! before dispatch. Each variant carries only what that event kind
//! guarantees; names the library does not recognize become
//! [`NodeEvent::Unknown`] so newer servers never break dispatch.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::error::ParseError;
use crate::event::Event;
use crate::value::{Value, ValueId};

use super::Node;

/// Every node event name the library acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEventKind {
    WakeUp,
    Sleep,
    Dead,
    Alive,
    InterviewCompleted,
    InterviewFailed,
    Ready,
    ValueAdded,
    ValueUpdated,
    ValueRemoved,
    ValueNotification,
    MetadataUpdated,
    Notification,
    FirmwareUpdateProgress,
    FirmwareUpdateFinished,
}

impl NodeEventKind {
    /// All recognized kinds.
    pub const ALL: [Self; 15] = [
        Self::WakeUp,
        Self::Sleep,
        Self::Dead,
        Self::Alive,
        Self::InterviewCompleted,
        Self::InterviewFailed,
        Self::Ready,
        Self::ValueAdded,
        Self::ValueUpdated,
        Self::ValueRemoved,
        Self::ValueNotification,
        Self::MetadataUpdated,
        Self::Notification,
        Self::FirmwareUpdateProgress,
        Self::FirmwareUpdateFinished,
    ];

    /// Looks up the kind for a protocol event name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Returns the protocol event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WakeUp => "wake up",
            Self::Sleep => "sleep",
            Self::Dead => "dead",
            Self::Alive => "alive",
            Self::InterviewCompleted => "interview completed",
            Self::InterviewFailed => "interview failed",
            Self::Ready => "ready",
            Self::ValueAdded => "value added",
            Self::ValueUpdated => "value updated",
            Self::ValueRemoved => "value removed",
            Self::ValueNotification => "value notification",
            Self::MetadataUpdated => "metadata updated",
            Self::Notification => "notification",
            Self::FirmwareUpdateProgress => "firmware update progress",
            Self::FirmwareUpdateFinished => "firmware update finished",
        }
    }

    /// Returns `true` for events that carry a value in `args`.
    #[must_use]
    pub const fn is_value_event(&self) -> bool {
        matches!(
            self,
            Self::ValueAdded
                | Self::ValueUpdated
                | Self::ValueRemoved
                | Self::ValueNotification
                | Self::MetadataUpdated
        )
    }
}

impl fmt::Display for NodeEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `args` object of a value event, with its identity already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueArgs {
    id: ValueId,
    payload: Map<String, JsonValue>,
}

impl ValueArgs {
    /// Parses value event arguments.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the identity fields are missing or invalid.
    pub fn from_payload(payload: Map<String, JsonValue>) -> Result<Self, ParseError> {
        let id = ValueId::from_payload(&payload)?;
        Ok(Self { id, payload })
    }

    /// Key of the value the event concerns.
    #[must_use]
    pub fn id(&self) -> &ValueId {
        &self.id
    }

    /// The raw `args` object.
    #[must_use]
    pub fn payload(&self) -> &Map<String, JsonValue> {
        &self.payload
    }

    /// Builds a fresh value from these arguments.
    pub(crate) fn to_value(&self) -> Value {
        Value::from_args(self.id.clone(), &self.payload)
    }
}

/// A parsed node event.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    WakeUp,
    Sleep,
    Dead,
    Alive,
    InterviewCompleted,
    /// Interview failed; `args` holds the failure details when reported.
    InterviewFailed {
        args: Map<String, JsonValue>,
    },
    Ready,
    ValueAdded(ValueArgs),
    ValueUpdated(ValueArgs),
    ValueRemoved(ValueArgs),
    /// Stateless value event (e.g. a scene activation or button press).
    ///
    /// `None` when `args` carry no usable value identity.
    ValueNotification(Option<ValueArgs>),
    /// Metadata change notice; `None` when `args` carry no usable identity.
    MetadataUpdated(Option<ValueArgs>),
    /// Command class notification passthrough.
    Notification {
        /// The command class that produced it (`ccId`).
        command_class: Option<u16>,
        args: Map<String, JsonValue>,
    },
    FirmwareUpdateProgress {
        sent_fragments: Option<u32>,
        total_fragments: Option<u32>,
    },
    FirmwareUpdateFinished {
        status: Option<i64>,
    },
    /// An event name this library does not recognize.
    Unknown {
        name: String,
    },
}

impl NodeEvent {
    /// Parses an inbound event addressed to a node.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if a `value added`, `value updated` or
    /// `value removed` event lacks an `args` object or its identity fields.
    /// Other kinds never fail: `value notification` and `metadata updated`
    /// only change nothing, so their arguments are read leniently.
    pub fn from_event(event: &Event) -> Result<Self, ParseError> {
        let Some(kind) = NodeEventKind::from_name(event.name()) else {
            return Ok(Self::Unknown {
                name: event.name().to_string(),
            });
        };

        let data = event.data();
        Ok(match kind {
            NodeEventKind::WakeUp => Self::WakeUp,
            NodeEventKind::Sleep => Self::Sleep,
            NodeEventKind::Dead => Self::Dead,
            NodeEventKind::Alive => Self::Alive,
            NodeEventKind::InterviewCompleted => Self::InterviewCompleted,
            NodeEventKind::InterviewFailed => Self::InterviewFailed {
                args: event.args().cloned().unwrap_or_default(),
            },
            NodeEventKind::Ready => Self::Ready,
            NodeEventKind::ValueAdded => Self::ValueAdded(value_args(event)?),
            NodeEventKind::ValueUpdated => Self::ValueUpdated(value_args(event)?),
            NodeEventKind::ValueRemoved => Self::ValueRemoved(value_args(event)?),
            NodeEventKind::ValueNotification => {
                Self::ValueNotification(lenient_value_args(event))
            }
            NodeEventKind::MetadataUpdated => Self::MetadataUpdated(lenient_value_args(event)),
            NodeEventKind::Notification => Self::Notification {
                command_class: data
                    .get("ccId")
                    .and_then(JsonValue::as_u64)
                    .and_then(|cc| u16::try_from(cc).ok()),
                args: event.args().cloned().unwrap_or_default(),
            },
            NodeEventKind::FirmwareUpdateProgress => Self::FirmwareUpdateProgress {
                sent_fragments: u32_field(data, "sentFragments"),
                total_fragments: u32_field(data, "totalFragments"),
            },
            NodeEventKind::FirmwareUpdateFinished => Self::FirmwareUpdateFinished {
                status: data.get("status").and_then(JsonValue::as_i64),
            },
        })
    }

    /// Returns the kind, or `None` for unrecognized events.
    #[must_use]
    pub fn kind(&self) -> Option<NodeEventKind> {
        Some(match self {
            Self::WakeUp => NodeEventKind::WakeUp,
            Self::Sleep => NodeEventKind::Sleep,
            Self::Dead => NodeEventKind::Dead,
            Self::Alive => NodeEventKind::Alive,
            Self::InterviewCompleted => NodeEventKind::InterviewCompleted,
            Self::InterviewFailed { .. } => NodeEventKind::InterviewFailed,
            Self::Ready => NodeEventKind::Ready,
            Self::ValueAdded(_) => NodeEventKind::ValueAdded,
            Self::ValueUpdated(_) => NodeEventKind::ValueUpdated,
            Self::ValueRemoved(_) => NodeEventKind::ValueRemoved,
            Self::ValueNotification(_) => NodeEventKind::ValueNotification,
            Self::MetadataUpdated(_) => NodeEventKind::MetadataUpdated,
            Self::Notification { .. } => NodeEventKind::Notification,
            Self::FirmwareUpdateProgress { .. } => NodeEventKind::FirmwareUpdateProgress,
            Self::FirmwareUpdateFinished { .. } => NodeEventKind::FirmwareUpdateFinished,
            Self::Unknown { .. } => return None,
        })
    }

    /// Returns the protocol event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Unknown { name } => name,
            known => known.kind().map_or("", |kind| kind.as_str()),
        }
    }

    /// Returns the value arguments for value events.
    #[must_use]
    pub fn value_args(&self) -> Option<&ValueArgs> {
        match self {
            Self::ValueAdded(args) | Self::ValueUpdated(args) | Self::ValueRemoved(args) => {
                Some(args)
            }
            Self::ValueNotification(args) | Self::MetadataUpdated(args) => args.as_ref(),
            _ => None,
        }
    }
}

/// Payload handed to node listeners.
///
/// Built after the node has reconciled the event. `node` is always the node
/// that received the event; `value` is the affected value for value events
/// (for `value removed` it is the value that was just removed).
#[derive(Debug, Clone, Copy)]
pub struct NodeEventData<'a> {
    /// The reconciled event.
    pub event: &'a NodeEvent,
    /// The node that received the event, after reconciliation.
    pub node: &'a Node,
    /// The affected value, if any.
    pub value: Option<&'a Value>,
}

impl NodeEventData<'_> {
    /// Returns the protocol event name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.event.name()
    }
}

fn value_args(event: &Event) -> Result<ValueArgs, ParseError> {
    let args = event
        .args()
        .cloned()
        .ok_or_else(|| ParseError::MissingField("args".to_string()))?;
    ValueArgs::from_payload(args)
}

fn lenient_value_args(event: &Event) -> Option<ValueArgs> {
    match value_args(event) {
        Ok(args) => Some(args),
        Err(err) => {
            tracing::debug!(
                event = %event.name(),
                error = %err,
                "No usable value identity, emitting without a value"
            );
            None
        }
    }
}

fn u32_field(data: &Map<String, JsonValue>, key: &str) -> Option<u32> {
    data.get(key)
        .and_then(JsonValue::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: JsonValue) -> Event {
        Event::from_json(value).unwrap()
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in NodeEventKind::ALL {
            assert_eq!(NodeEventKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeEventKind::from_name("value exploded"), None);
    }

    #[test]
    fn value_event_kinds() {
        assert!(NodeEventKind::ValueUpdated.is_value_event());
        assert!(NodeEventKind::MetadataUpdated.is_value_event());
        assert!(!NodeEventKind::Notification.is_value_event());
        assert!(!NodeEventKind::WakeUp.is_value_event());
    }

    #[test]
    fn parses_value_updated() {
        let parsed = NodeEvent::from_event(&event(json!({
            "source": "node",
            "event": "value updated",
            "nodeId": 52,
            "args": {
                "commandClassName": "Basic",
                "commandClass": 32,
                "endpoint": 0,
                "property": "currentValue",
                "newValue": 255,
                "prevValue": 255,
                "propertyName": "currentValue"
            }
        })))
        .unwrap();

        assert_eq!(parsed.kind(), Some(NodeEventKind::ValueUpdated));
        assert_eq!(parsed.name(), "value updated");
        let args = parsed.value_args().unwrap();
        assert_eq!(args.id().to_string(), "32-0-currentValue");
        assert_eq!(args.payload().get("newValue"), Some(&json!(255)));
    }

    #[test]
    fn value_event_without_args_is_rejected() {
        let err = NodeEvent::from_event(&event(json!({"event": "value added", "nodeId": 1})))
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingField(f) if f == "args"));
    }

    #[test]
    fn value_event_with_bad_identity_is_rejected() {
        let err = NodeEvent::from_event(&event(json!({
            "event": "value removed",
            "args": {"commandClass": 38, "property": "currentValue"}
        })))
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingField(f) if f == "endpoint"));
    }

    #[test]
    fn notice_events_tolerate_missing_identity() {
        for name in ["value notification", "metadata updated"] {
            let parsed = NodeEvent::from_event(&event(json!({"event": name}))).unwrap();
            assert_eq!(parsed.name(), name);
            assert!(parsed.value_args().is_none());

            let parsed = NodeEvent::from_event(&event(json!({
                "event": name,
                "args": {"commandClass": 38, "property": "currentValue"}
            })))
            .unwrap();
            assert!(parsed.value_args().is_none());

            let parsed = NodeEvent::from_event(&event(json!({
                "event": name,
                "args": {"commandClass": 38, "endpoint": 0, "property": "currentValue"}
            })))
            .unwrap();
            assert_eq!(
                parsed.value_args().map(|args| args.id().to_string()),
                Some("38-0-currentValue".to_string())
            );
        }
    }

    #[test]
    fn unknown_names_are_not_errors() {
        let parsed = NodeEvent::from_event(&event(json!({"event": "statistics updated"}))).unwrap();
        assert_eq!(
            parsed,
            NodeEvent::Unknown {
                name: "statistics updated".to_string()
            }
        );
        assert_eq!(parsed.kind(), None);
        assert_eq!(parsed.name(), "statistics updated");
        assert!(parsed.value_args().is_none());
    }

    #[test]
    fn parses_notification() {
        let parsed = NodeEvent::from_event(&event(json!({
            "event": "notification",
            "nodeId": 9,
            "ccId": 113,
            "args": {"type": 6, "event": 22, "label": "Access Control"}
        })))
        .unwrap();

        let NodeEvent::Notification {
            command_class,
            args,
        } = parsed
        else {
            panic!("expected a notification");
        };
        assert_eq!(command_class, Some(113));
        assert_eq!(args.get("label"), Some(&json!("Access Control")));
    }

    #[test]
    fn parses_firmware_progress_leniently() {
        let parsed = NodeEvent::from_event(&event(json!({
            "event": "firmware update progress",
            "sentFragments": 10,
            "totalFragments": 200
        })))
        .unwrap();
        assert_eq!(
            parsed,
            NodeEvent::FirmwareUpdateProgress {
                sent_fragments: Some(10),
                total_fragments: Some(200)
            }
        );

        let parsed =
            NodeEvent::from_event(&event(json!({"event": "firmware update finished"}))).unwrap();
        assert_eq!(parsed, NodeEvent::FirmwareUpdateFinished { status: None });
    }

    #[test]
    fn interview_failed_without_args() {
        let parsed = NodeEvent::from_event(&event(json!({"event": "interview failed"}))).unwrap();
        assert_eq!(parsed, NodeEvent::InterviewFailed { args: Map::new() });
    }
}
