// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound events as decoded from server messages.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::ParseError;
use crate::node::NodeId;

/// One inbound protocol event.
///
/// The payload is the event object exactly as the server sent it: `source`,
/// `event` (the name), `nodeId` for node events, and event specific fields
/// such as `args`. Entities parse it into their own typed event before
/// acting on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    data: Map<String, JsonValue>,
}

/// Envelope of a server message, `{"type": "...", "event": {...}}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    event: Option<Map<String, JsonValue>>,
}

impl Event {
    /// Creates an event from a name and payload.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Map<String, JsonValue>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Creates an event from the server's event object.
    ///
    /// The name is taken from the object's `event` field.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if `value` is not an object or has no string
    /// `event` field.
    pub fn from_json(value: JsonValue) -> Result<Self, ParseError> {
        match value {
            JsonValue::Object(data) => Self::from_object(data),
            other => Err(ParseError::UnexpectedFormat(format!(
                "event must be an object, got {other}"
            ))),
        }
    }

    fn from_object(data: Map<String, JsonValue>) -> Result<Self, ParseError> {
        let name = match data.get("event") {
            Some(JsonValue::String(name)) => name.clone(),
            Some(other) => {
                return Err(ParseError::invalid("event", format!("expected a string, got {other}")));
            }
            None => return Err(ParseError::MissingField("event".to_string())),
        };
        Ok(Self { name, data })
    }

    /// Decodes a full server message.
    ///
    /// # Examples
    ///
    /// ```
    /// use zwave_model::Event;
    ///
    /// let text = r#"{
    ///     "type": "event",
    ///     "event": {
    ///         "source": "node",
    ///         "event": "value updated",
    ///         "nodeId": 52,
    ///         "args": {
    ///             "commandClassName": "Basic",
    ///             "commandClass": 32,
    ///             "endpoint": 0,
    ///             "property": "currentValue",
    ///             "newValue": 255,
    ///             "prevValue": 255,
    ///             "propertyName": "currentValue"
    ///         }
    ///     }
    /// }"#;
    ///
    /// let event = Event::from_message(text).unwrap();
    /// assert_eq!(event.name(), "value updated");
    /// assert_eq!(event.source(), Some("node"));
    /// assert_eq!(event.node_id(), Some(52));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` for invalid JSON and
    /// `ParseError::UnexpectedFormat` for messages that are not events
    /// (command results, version banners, ...).
    pub fn from_message(text: &str) -> Result<Self, ParseError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        if envelope.kind != "event" {
            return Err(ParseError::UnexpectedFormat(format!(
                "expected an event message, got type `{}`",
                envelope.kind
            )));
        }
        let data = envelope
            .event
            .ok_or_else(|| ParseError::MissingField("event".to_string()))?;
        Self::from_object(data)
    }

    /// Returns the event name, e.g. `"value updated"`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw payload.
    #[must_use]
    pub fn data(&self) -> &Map<String, JsonValue> {
        &self.data
    }

    /// Returns the entity kind the event concerns (`"node"`, `"controller"`, ...).
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.data.get("source").and_then(JsonValue::as_str)
    }

    /// Returns the addressed node, for node events.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        self.data
            .get("nodeId")
            .and_then(JsonValue::as_u64)
            .and_then(|id| NodeId::try_from(id).ok())
    }

    /// Returns the `args` object, if present.
    #[must_use]
    pub fn args(&self) -> Option<&Map<String, JsonValue>> {
        self.data.get("args").and_then(JsonValue::as_object)
    }

    /// Returns the payload serialized as JSON text, for diagnostics.
    #[must_use]
    pub(crate) fn payload_text(&self) -> String {
        JsonValue::Object(self.data.clone()).to_string()
    }
}
