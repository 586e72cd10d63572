// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value identifiers.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::error::ParseError;

/// A property or property key as reported by the server.
///
/// Z-Wave JS uses either a name (`"currentValue"`) or a number (a
/// configuration parameter index, a meter scale, ...) in both positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropertyId {
    /// Numeric identifier.
    Number(i64),
    /// Named identifier.
    Name(String),
}

impl PropertyId {
    /// Reads a property identifier from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidValue` for anything other than an integer
    /// or a non-empty string.
    pub fn from_json(field: &str, value: &JsonValue) -> Result<Self, ParseError> {
        match value {
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Number)
                .ok_or_else(|| ParseError::invalid(field, format!("{n} is not an integer"))),
            JsonValue::String(s) if !s.is_empty() => Ok(Self::Name(s.clone())),
            JsonValue::String(_) => Err(ParseError::invalid(field, "empty string")),
            other => Err(ParseError::invalid(
                field,
                format!("expected integer or string, got {other}"),
            )),
        }
    }

    /// Returns the name if this is a named identifier.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name.as_str()),
            Self::Number(_) => None,
        }
    }

    /// Returns the number if this is a numeric identifier.
    #[must_use]
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Name(_) => None,
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for PropertyId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropertyId {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for PropertyId {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

/// Identity of a value within its node.
///
/// Built from the four identity fields of a value payload. Node value maps
/// are keyed by this structure, so two values only share a key when all four
/// fields are equal. The [`Display`](fmt::Display) form is
/// `{commandClass}-{endpoint}-{property}` with `-{propertyKey}` appended when
/// a property key is present.
///
/// # Examples
///
/// ```
/// use zwave_model::value::{PropertyId, ValueId};
///
/// let id = ValueId::new(38, 0, PropertyId::from("currentValue"));
/// assert_eq!(id.to_string(), "38-0-currentValue");
///
/// let keyed = ValueId::new(50, 1, PropertyId::from("value"))
///     .with_property_key(PropertyId::from(65537));
/// assert_eq!(keyed.to_string(), "50-1-value-65537");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueId {
    command_class: u16,
    endpoint: u16,
    property: PropertyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property_key: Option<PropertyId>,
}

impl ValueId {
    /// Creates a value identifier without a property key.
    #[must_use]
    pub fn new(command_class: u16, endpoint: u16, property: PropertyId) -> Self {
        Self {
            command_class,
            endpoint,
            property,
            property_key: None,
        }
    }

    /// Sets the property key.
    #[must_use]
    pub fn with_property_key(mut self, property_key: PropertyId) -> Self {
        self.property_key = Some(property_key);
        self
    }

    /// Computes the identifier from a value payload or event `args` object.
    ///
    /// `commandClass`, `endpoint` and `property` are required. A missing or
    /// `null` `propertyKey` means the value has no property key.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` when a required field is absent and
    /// `ParseError::InvalidValue` when a field has the wrong type.
    pub fn from_payload(payload: &Map<String, JsonValue>) -> Result<Self, ParseError> {
        let command_class = unsigned_field(payload, "commandClass")?;
        let endpoint = unsigned_field(payload, "endpoint")?;
        let property = payload
            .get("property")
            .ok_or_else(|| ParseError::MissingField("property".to_string()))
            .and_then(|v| PropertyId::from_json("property", v))?;
        let property_key = match payload.get("propertyKey") {
            None | Some(JsonValue::Null) => None,
            Some(v) => Some(PropertyId::from_json("propertyKey", v)?),
        };

        Ok(Self {
            command_class,
            endpoint,
            property,
            property_key,
        })
    }

    /// Returns the command class identifier.
    #[must_use]
    pub fn command_class(&self) -> u16 {
        self.command_class
    }

    /// Returns the endpoint index.
    #[must_use]
    pub fn endpoint(&self) -> u16 {
        self.endpoint
    }

    /// Returns the property.
    #[must_use]
    pub fn property(&self) -> &PropertyId {
        &self.property
    }

    /// Returns the property key, if any.
    #[must_use]
    pub fn property_key(&self) -> Option<&PropertyId> {
        self.property_key.as_ref()
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.command_class, self.endpoint, self.property)?;
        if let Some(key) = &self.property_key {
            write!(f, "-{key}")?;
        }
        Ok(())
    }
}

fn unsigned_field(payload: &Map<String, JsonValue>, field: &str) -> Result<u16, ParseError> {
    let value = payload
        .get(field)
        .ok_or_else(|| ParseError::MissingField(field.to_string()))?;
    value
        .as_u64()
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| {
            ParseError::invalid(
                field,
                format!("expected an integer in 0..=65535, got {value}"),
            )
        })
}
