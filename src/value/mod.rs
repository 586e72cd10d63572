// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node values.
//!
//! A [`Value`] is one reported property of a node, such as a sensor reading
//! or a configuration parameter. It keeps the latest payload the server sent
//! for one `(commandClass, endpoint, property, propertyKey)` tuple, which is
//! captured as its [`ValueId`].
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use zwave_model::value::Value;
//!
//! let payload = json!({
//!     "commandClass": 38,
//!     "commandClassName": "Multilevel Switch",
//!     "endpoint": 0,
//!     "property": "currentValue",
//!     "value": 0
//! });
//! let value = Value::from_payload(payload.as_object().unwrap().clone()).unwrap();
//!
//! assert_eq!(value.id().to_string(), "38-0-currentValue");
//! assert_eq!(value.command_class_name(), Some("Multilevel Switch"));
//! ```

mod metadata;
mod value_id;

pub use metadata::ValueMetadata;
pub use value_id::{PropertyId, ValueId};

use serde_json::{Map, Value as JsonValue};

use crate::error::ParseError;

/// Payload fields that make up a value's identity.
const IDENTITY_FIELDS: [&str; 4] = ["commandClass", "endpoint", "property", "propertyKey"];

/// Latest known state of one node value.
///
/// The payload is kept as reported; apart from the identity fields it is
/// treated as an opaque bag with a few convenience accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    id: ValueId,
    data: Map<String, JsonValue>,
}

impl Value {
    /// Creates a value from a server payload.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the payload lacks a valid identity.
    pub fn from_payload(data: Map<String, JsonValue>) -> Result<Self, ParseError> {
        let id = ValueId::from_payload(&data)?;
        Ok(Self { id, data })
    }

    /// Creates a value from event arguments whose identity is already known.
    ///
    /// A `newValue` in the arguments becomes the current `value`.
    pub(crate) fn from_args(id: ValueId, args: &Map<String, JsonValue>) -> Self {
        let mut data = args.clone();
        if let Some(new_value) = args.get("newValue") {
            data.insert("value".to_string(), new_value.clone());
        }
        Self { id, data }
    }

    /// Returns the value's identity key.
    #[must_use]
    pub fn id(&self) -> &ValueId {
        &self.id
    }

    /// Returns the raw payload.
    #[must_use]
    pub fn data(&self) -> &Map<String, JsonValue> {
        &self.data
    }

    /// Command class the value belongs to.
    #[must_use]
    pub fn command_class(&self) -> u16 {
        self.id.command_class()
    }

    /// Endpoint the value belongs to.
    #[must_use]
    pub fn endpoint(&self) -> u16 {
        self.id.endpoint()
    }

    /// Property within the command class.
    #[must_use]
    pub fn property(&self) -> &PropertyId {
        self.id.property()
    }

    /// Sub-key of the property, if any.
    #[must_use]
    pub fn property_key(&self) -> Option<&PropertyId> {
        self.id.property_key()
    }

    /// Human readable command class name, e.g. `"Binary Switch"`.
    #[must_use]
    pub fn command_class_name(&self) -> Option<&str> {
        self.str_field("commandClassName")
    }

    /// Human readable property name.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        self.str_field("propertyName")
    }

    /// Human readable property key name.
    #[must_use]
    pub fn property_key_name(&self) -> Option<&str> {
        self.str_field("propertyKeyName")
    }

    /// The current reading.
    ///
    /// Updated from `newValue` whenever an update is merged.
    #[must_use]
    pub fn value(&self) -> Option<&JsonValue> {
        self.field("value")
    }

    /// `newValue` from the most recent update, if one carried it.
    #[must_use]
    pub fn new_value(&self) -> Option<&JsonValue> {
        self.field("newValue")
    }

    /// `prevValue` from the most recent update, if one carried it.
    #[must_use]
    pub fn prev_value(&self) -> Option<&JsonValue> {
        self.field("prevValue")
    }

    /// Returns a view over the value's metadata.
    #[must_use]
    pub fn metadata(&self) -> ValueMetadata<'_> {
        ValueMetadata::new(self.data.get("metadata").and_then(JsonValue::as_object))
    }

    /// Returns an arbitrary payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(JsonValue::as_str)
    }

    /// Merges an update payload into this value.
    ///
    /// Every field present in `update` replaces the stored field; fields the
    /// update does not mention are kept. Identity fields are never touched.
    /// A `newValue` is also stored as the current `value`.
    pub(crate) fn merge_update(&mut self, update: &Map<String, JsonValue>) {
        for (key, field) in update {
            if IDENTITY_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.data.insert(key.clone(), field.clone());
        }
        if let Some(new_value) = update.get("newValue") {
            self.data.insert("value".to_string(), new_value.clone());
        }
    }
}
