// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only view over a value's `metadata` object.

use serde_json::{Map, Value as JsonValue};

/// Metadata describing how a value can be read, written and displayed.
///
/// This is a borrowed projection of the `metadata` object in the value
/// payload. Every accessor returns `None` when the field is absent, so a
/// value without metadata yields an empty view rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct ValueMetadata<'a> {
    data: Option<&'a Map<String, JsonValue>>,
}

impl<'a> ValueMetadata<'a> {
    pub(crate) fn new(data: Option<&'a Map<String, JsonValue>>) -> Self {
        Self { data }
    }

    fn get(&self, key: &str) -> Option<&'a JsonValue> {
        self.data.and_then(|data| data.get(key))
    }

    /// Returns `true` if the payload carried no metadata object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_none_or(Map::is_empty)
    }

    /// Value type (`"number"`, `"boolean"`, `"string"`, `"any"`, ...).
    #[must_use]
    pub fn value_type(&self) -> Option<&'a str> {
        self.get("type").and_then(JsonValue::as_str)
    }

    /// Whether the value can be read.
    #[must_use]
    pub fn readable(&self) -> Option<bool> {
        self.get("readable").and_then(JsonValue::as_bool)
    }

    /// Whether the value can be written.
    #[must_use]
    pub fn writeable(&self) -> Option<bool> {
        self.get("writeable").and_then(JsonValue::as_bool)
    }

    /// Human readable label.
    #[must_use]
    pub fn label(&self) -> Option<&'a str> {
        self.get("label").and_then(JsonValue::as_str)
    }

    /// Longer description of the value.
    #[must_use]
    pub fn description(&self) -> Option<&'a str> {
        self.get("description").and_then(JsonValue::as_str)
    }

    /// Minimum allowed value for numeric values.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.get("min").and_then(JsonValue::as_f64)
    }

    /// Maximum allowed value for numeric values.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.get("max").and_then(JsonValue::as_f64)
    }

    /// Unit of numeric values, e.g. `"°C"`.
    #[must_use]
    pub fn unit(&self) -> Option<&'a str> {
        self.get("unit").and_then(JsonValue::as_str)
    }

    /// Enumerated states, mapping the raw value (as a string) to a label.
    #[must_use]
    pub fn states(&self) -> Option<&'a Map<String, JsonValue>> {
        self.get("states").and_then(JsonValue::as_object)
    }

    /// Returns the raw metadata object.
    #[must_use]
    pub fn raw(&self) -> Option<&'a Map<String, JsonValue>> {
        self.data
    }
}
