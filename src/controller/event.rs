// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed controller events and their payload pieces.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ParseError;
use crate::event::Event;
use crate::node::{Node, NodeId};

use super::Controller;

/// Security class a node can be granted during inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SecurityClass {
    S2Unauthenticated,
    S2Authenticated,
    S2AccessControl,
    S0Legacy,
}

impl SecurityClass {
    /// Numeric identifier used on the wire.
    #[must_use]
    pub const fn as_num(&self) -> i64 {
        match self {
            Self::S2Unauthenticated => 0,
            Self::S2Authenticated => 1,
            Self::S2AccessControl => 2,
            Self::S0Legacy => 7,
        }
    }
}

impl TryFrom<i64> for SecurityClass {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::S2Unauthenticated),
            1 => Ok(Self::S2Authenticated),
            2 => Ok(Self::S2AccessControl),
            7 => Ok(Self::S0Legacy),
            other => Err(format!("unknown security class {other}")),
        }
    }
}

impl From<SecurityClass> for i64 {
    fn from(value: SecurityClass) -> Self {
        value.as_num()
    }
}

/// Security classes requested by a joining node, or granted to it.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use zwave_model::controller::{InclusionGrant, SecurityClass};
///
/// let grant: InclusionGrant = serde_json::from_value(json!({
///     "securityClasses": [0, 7],
///     "clientSideAuth": false
/// }))
/// .unwrap();
///
/// assert_eq!(
///     grant.security_classes,
///     vec![SecurityClass::S2Unauthenticated, SecurityClass::S0Legacy]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionGrant {
    pub security_classes: Vec<SecurityClass>,
    pub client_side_auth: bool,
}

/// Progress of an NVM backup, conversion or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NvmProgress {
    /// Bytes read (backup, convert) or written (restore) so far.
    pub bytes_done: u64,
    pub total_bytes: u64,
}

impl NvmProgress {
    /// Completion as a percentage in `0.0..=100.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64 * 100.0).min(100.0)
    }

    fn from_fields(data: &Map<String, JsonValue>, done_field: &str) -> Result<Self, ParseError> {
        Ok(Self {
            bytes_done: required_u64(data, done_field)?,
            total_bytes: required_u64(data, "total")?,
        })
    }
}

/// Inclusion state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InclusionState {
    Idle,
    Including,
    Excluding,
    Busy,
    SmartStart,
}

impl InclusionState {
    /// Converts the server's numeric state.
    #[must_use]
    pub const fn from_num(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Including),
            2 => Some(Self::Excluding),
            3 => Some(Self::Busy),
            4 => Some(Self::SmartStart),
            _ => None,
        }
    }
}

/// A parsed controller event.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    InclusionFailed,
    ExclusionFailed,
    InclusionStarted {
        /// Whether secure inclusion was requested, when reported.
        secure: Option<bool>,
    },
    ExclusionStarted,
    InclusionStopped,
    ExclusionStopped,
    /// The server wants the user to confirm a joining node's DSK.
    ValidateDskAndEnterPin {
        dsk: Option<String>,
    },
    /// A node joined; `snapshot` is its full state.
    NodeAdded {
        snapshot: Map<String, JsonValue>,
    },
    NodeRemoved {
        node_id: NodeId,
    },
    /// Per-node heal status, e.g. `pending`, `done`, `failed`, `skipped`.
    HealNetworkProgress {
        progress: HashMap<NodeId, String>,
    },
    HealNetworkDone,
    /// Changed controller statistics fields.
    StatisticsUpdated {
        statistics: Map<String, JsonValue>,
    },
    GrantSecurityClasses {
        requested: InclusionGrant,
    },
    NvmBackupProgress(NvmProgress),
    NvmConvertProgress(NvmProgress),
    NvmRestoreProgress(NvmProgress),
    /// An event name this library does not recognize.
    Unknown {
        name: String,
    },
}

impl ControllerEvent {
    /// Parses an inbound controller event.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` when a recognized event lacks the fields its
    /// reconciliation needs.
    pub fn from_event(event: &Event) -> Result<Self, ParseError> {
        let data = event.data();
        Ok(match event.name() {
            "inclusion failed" => Self::InclusionFailed,
            "exclusion failed" => Self::ExclusionFailed,
            "inclusion started" => Self::InclusionStarted {
                secure: data.get("secure").and_then(JsonValue::as_bool),
            },
            "exclusion started" => Self::ExclusionStarted,
            "inclusion stopped" => Self::InclusionStopped,
            "exclusion stopped" => Self::ExclusionStopped,
            "validate dsk and enter pin" => Self::ValidateDskAndEnterPin {
                dsk: data.get("dsk")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
            },
            "node added" => Self::NodeAdded {
                snapshot: required_object(data, "node")?.clone(),
            },
            "node removed" => Self::NodeRemoved {
                node_id: node_id_of(required_object(data, "node")?)?,
            },
            "heal network progress" => Self::HealNetworkProgress {
                progress: parse_heal_progress(required_object(data, "progress")?)?,
            },
            "heal network done" => Self::HealNetworkDone,
            "statistics updated" => Self::StatisticsUpdated {
                statistics: required_object(data, "statistics")?.clone(),
            },
            "grant security classes" => Self::GrantSecurityClasses {
                requested: serde_json::from_value(JsonValue::Object(
                    required_object(data, "requested")?.clone(),
                ))?,
            },
            "nvm backup progress" => {
                Self::NvmBackupProgress(NvmProgress::from_fields(data, "bytesRead")?)
            }
            "nvm convert progress" => {
                Self::NvmConvertProgress(NvmProgress::from_fields(data, "bytesRead")?)
            }
            "nvm restore progress" => {
                Self::NvmRestoreProgress(NvmProgress::from_fields(data, "bytesWritten")?)
            }
            other => Self::Unknown {
                name: other.to_string(),
            },
        })
    }

    /// Returns the protocol event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::InclusionFailed => "inclusion failed",
            Self::ExclusionFailed => "exclusion failed",
            Self::InclusionStarted { .. } => "inclusion started",
            Self::ExclusionStarted => "exclusion started",
            Self::InclusionStopped => "inclusion stopped",
            Self::ExclusionStopped => "exclusion stopped",
            Self::ValidateDskAndEnterPin { .. } => "validate dsk and enter pin",
            Self::NodeAdded { .. } => "node added",
            Self::NodeRemoved { .. } => "node removed",
            Self::HealNetworkProgress { .. } => "heal network progress",
            Self::HealNetworkDone => "heal network done",
            Self::StatisticsUpdated { .. } => "statistics updated",
            Self::GrantSecurityClasses { .. } => "grant security classes",
            Self::NvmBackupProgress(_) => "nvm backup progress",
            Self::NvmConvertProgress(_) => "nvm convert progress",
            Self::NvmRestoreProgress(_) => "nvm restore progress",
            Self::Unknown { name } => name,
        }
    }

    /// Returns the progress of NVM events.
    #[must_use]
    pub fn nvm_progress(&self) -> Option<&NvmProgress> {
        match self {
            Self::NvmBackupProgress(progress)
            | Self::NvmConvertProgress(progress)
            | Self::NvmRestoreProgress(progress) => Some(progress),
            _ => None,
        }
    }

    /// Returns the requested grant of `grant security classes` events.
    #[must_use]
    pub fn requested_grant(&self) -> Option<&InclusionGrant> {
        match self {
            Self::GrantSecurityClasses { requested } => Some(requested),
            _ => None,
        }
    }
}

impl fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload handed to controller listeners.
#[derive(Debug, Clone, Copy)]
pub struct ControllerEventData<'a> {
    /// The reconciled event.
    pub event: &'a ControllerEvent,
    /// The controller, after reconciliation.
    pub controller: &'a Controller,
    /// The node added or removed, for node lifecycle events.
    pub node: Option<&'a Node>,
}

impl ControllerEventData<'_> {
    /// Returns the protocol event name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.event.name()
    }
}

fn required_object<'a>(
    data: &'a Map<String, JsonValue>,
    field: &str,
) -> Result<&'a Map<String, JsonValue>, ParseError> {
    match data.get(field) {
        Some(JsonValue::Object(object)) => Ok(object),
        Some(other) => Err(ParseError::invalid(field, format!("expected an object, got {other}"))),
        None => Err(ParseError::MissingField(field.to_string())),
    }
}

fn required_u64(data: &Map<String, JsonValue>, field: &str) -> Result<u64, ParseError> {
    let raw = data
        .get(field)
        .ok_or_else(|| ParseError::MissingField(field.to_string()))?;
    raw.as_u64()
        .ok_or_else(|| ParseError::invalid(field, format!("expected a byte count, got {raw}")))
}

fn node_id_of(node: &Map<String, JsonValue>) -> Result<NodeId, ParseError> {
    let raw = node
        .get("nodeId")
        .ok_or_else(|| ParseError::MissingField("nodeId".to_string()))?;
    raw.as_u64()
        .and_then(|id| NodeId::try_from(id).ok())
        .ok_or_else(|| ParseError::invalid("nodeId", format!("expected a node id, got {raw}")))
}

// Keys arrive as strings since JSON object keys always are
fn parse_heal_progress(
    progress: &Map<String, JsonValue>,
) -> Result<HashMap<NodeId, String>, ParseError> {
    progress
        .iter()
        .map(|(key, status)| {
            let node_id = key
                .parse::<NodeId>()
                .map_err(|_| ParseError::invalid("progress", format!("`{key}` is not a node id")))?;
            let status = status.as_str().ok_or_else(|| {
                ParseError::invalid("progress", format!("status of node {node_id} is {status}"))
            })?;
            Ok((node_id, status.to_string()))
        })
        .collect()
}
