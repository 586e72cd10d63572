// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Descriptive sub-objects of a node snapshot.
//!
//! The device class and device configuration are passed through from the
//! server without validation. These views only offer a few convenience
//! reads; everything else is reachable through `raw()`.

use serde_json::{Map, Value as JsonValue};

/// View over a node's `deviceClass` object.
#[derive(Debug, Clone, Copy)]
pub struct DeviceClass<'a> {
    data: Option<&'a Map<String, JsonValue>>,
}

impl<'a> DeviceClass<'a> {
    pub(crate) fn new(data: Option<&'a Map<String, JsonValue>>) -> Self {
        Self { data }
    }

    /// Label of the basic device class.
    #[must_use]
    pub fn basic(&self) -> Option<&'a str> {
        self.class_label("basic")
    }

    /// Label of the generic device class.
    #[must_use]
    pub fn generic(&self) -> Option<&'a str> {
        self.class_label("generic")
    }

    /// Label of the specific device class.
    #[must_use]
    pub fn specific(&self) -> Option<&'a str> {
        self.class_label("specific")
    }

    /// Command classes the device class mandates as supported.
    #[must_use]
    pub fn mandatory_supported_ccs(&self) -> Vec<u16> {
        self.cc_list("mandatorySupportedCCs")
    }

    /// Command classes the device class mandates as controlled.
    #[must_use]
    pub fn mandatory_controlled_ccs(&self) -> Vec<u16> {
        self.cc_list("mandatoryControlledCCs")
    }

    /// Returns the underlying object, if reported.
    #[must_use]
    pub fn raw(&self) -> Option<&'a Map<String, JsonValue>> {
        self.data
    }

    // Servers report either a plain label or `{ "key": .., "label": .. }`
    fn class_label(&self, key: &str) -> Option<&'a str> {
        match self.data?.get(key)? {
            JsonValue::String(label) => Some(label.as_str()),
            JsonValue::Object(class) => class.get("label").and_then(JsonValue::as_str),
            _ => None,
        }
    }

    fn cc_list(&self, key: &str) -> Vec<u16> {
        self.data
            .and_then(|data| data.get(key))
            .and_then(JsonValue::as_array)
            .map(|ccs| {
                ccs.iter()
                    .filter_map(JsonValue::as_u64)
                    .filter_map(|cc| u16::try_from(cc).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// View over a node's `deviceConfig` object (the device database entry).
#[derive(Debug, Clone, Copy)]
pub struct DeviceConfig<'a> {
    data: Option<&'a Map<String, JsonValue>>,
}

impl<'a> DeviceConfig<'a> {
    pub(crate) fn new(data: Option<&'a Map<String, JsonValue>>) -> Self {
        Self { data }
    }

    fn str_field(&self, key: &str) -> Option<&'a str> {
        self.data?.get(key).and_then(JsonValue::as_str)
    }

    /// Manufacturer name.
    #[must_use]
    pub fn manufacturer(&self) -> Option<&'a str> {
        self.str_field("manufacturer")
    }

    /// Product label, e.g. `"ZW3010"`.
    #[must_use]
    pub fn label(&self) -> Option<&'a str> {
        self.str_field("label")
    }

    /// Product description.
    #[must_use]
    pub fn description(&self) -> Option<&'a str> {
        self.str_field("description")
    }

    /// Returns `true` if the server reported no device configuration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_none_or(Map::is_empty)
    }

    /// Returns the underlying object, if reported.
    #[must_use]
    pub fn raw(&self) -> Option<&'a Map<String, JsonValue>> {
        self.data
    }
}
