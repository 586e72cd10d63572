// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nodes and their event reconciliation.
//!
//! A [`Node`] is the client-side model of one device on the network. It holds
//! the raw snapshot the server reported and an index of the device's
//! [`Value`]s keyed by [`ValueId`]. Every scalar accessor is a pure read of
//! the snapshot; only the value index is actively reconciled as events
//! arrive (see [`Node::receive_event`]).
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use zwave_model::Node;
//! use zwave_model::node::NodeStatus;
//!
//! let node = Node::from_json(json!({
//!     "nodeId": 12,
//!     "status": 4,
//!     "name": "Hallway dimmer",
//!     "isListening": true,
//!     "values": [
//!         {"commandClass": 38, "endpoint": 0, "property": "currentValue", "value": 40}
//!     ]
//! }))
//! .unwrap();
//!
//! assert_eq!(node.node_id(), 12);
//! assert_eq!(node.status(), NodeStatus::Alive);
//! assert_eq!(node.name(), Some("Hallway dimmer"));
//! assert_eq!(node.values().len(), 1);
//! ```

mod descriptors;
mod dispatch;
mod event;
mod status;

pub use descriptors::{DeviceClass, DeviceConfig};
pub use event::{NodeEvent, NodeEventData, NodeEventKind, ValueArgs};
pub use status::NodeStatus;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::config::ReconcileConfig;
use crate::error::{ParseError, Result};
use crate::event::EventBus;
use crate::subscription::{EventEmitter, Subscribable, SubscriptionId};
use crate::value::{Value, ValueId};

/// Node identifier, unique on one controller.
pub type NodeId = u16;

/// Listener type for node events.
pub type NodeListener = dyn for<'a> Fn(&NodeEventData<'a>) + Send + Sync;

/// Client-side model of one device.
pub struct Node {
    node_id: NodeId,
    /// Snapshot fields, without the `values` list.
    data: Map<String, JsonValue>,
    values: HashMap<ValueId, Value>,
    emitter: EventEmitter<NodeListener>,
    config: ReconcileConfig,
    /// Values created by the update recovery path.
    recovered_values: u64,
    bus: Option<EventBus>,
}

impl Node {
    /// Creates a node from a server snapshot object.
    ///
    /// The snapshot's `values` list seeds the value index; it is not kept in
    /// the raw data. A missing `values` list means the node has no values yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if `nodeId` is missing or not a valid node id,
    /// if `values` is not a list, or if any listed value lacks a valid
    /// identity.
    pub fn new(mut data: Map<String, JsonValue>) -> Result<Self> {
        let node_id = parse_node_id(&data)?;

        let mut values = HashMap::new();
        match data.remove("values") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Array(list)) => {
                for entry in list {
                    let payload = match entry {
                        JsonValue::Object(payload) => payload,
                        other => {
                            return Err(ParseError::UnexpectedFormat(format!(
                                "node {node_id}: value entries must be objects, got {other}"
                            ))
                            .into());
                        }
                    };
                    let value = Value::from_payload(payload)?;
                    if let Some(previous) = values.insert(value.id().clone(), value) {
                        tracing::debug!(
                            node_id,
                            value_id = %previous.id(),
                            "Snapshot lists value twice, keeping the last entry"
                        );
                    }
                }
            }
            Some(other) => {
                return Err(
                    ParseError::invalid("values", format!("expected a list, got {other}")).into(),
                );
            }
        }

        tracing::debug!(node_id, values = values.len(), "Created node from snapshot");

        Ok(Self {
            node_id,
            data,
            values,
            emitter: EventEmitter::new(),
            config: ReconcileConfig::default(),
            recovered_values: 0,
            bus: None,
        })
    }

    /// Creates a node from a snapshot given as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if `snapshot` is not an object or is rejected
    /// by [`Node::new`].
    pub fn from_json(snapshot: JsonValue) -> Result<Self> {
        match snapshot {
            JsonValue::Object(data) => Self::new(data),
            other => Err(ParseError::UnexpectedFormat(format!(
                "node snapshot must be an object, got {other}"
            ))
            .into()),
        }
    }

    /// Sets the reconciliation settings.
    #[must_use]
    pub fn with_config(mut self, config: ReconcileConfig) -> Self {
        self.config = config;
        self
    }

    /// Publishes a summary of every dispatched event on `bus`.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub(crate) fn set_config(&mut self, config: ReconcileConfig) {
        self.config = config;
    }

    pub(crate) fn set_event_bus(&mut self, bus: Option<EventBus>) {
        self.bus = bus;
    }

    /// Registers a listener for the named event.
    ///
    /// The listener runs after the node has reconciled the event and sees
    /// the node's updated state.
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: Fn(&NodeEventData<'_>) + Send + Sync + 'static,
    {
        let listener: Arc<NodeListener> = Arc::new(listener);
        self.emitter.on(event, listener)
    }

    /// Returns the reconciliation settings in use.
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Returns the raw snapshot fields.
    #[must_use]
    pub fn data(&self) -> &Map<String, JsonValue> {
        &self.data
    }

    /// Returns all tracked values.
    #[must_use]
    pub fn values(&self) -> &HashMap<ValueId, Value> {
        &self.values
    }

    /// Looks up a tracked value.
    #[must_use]
    pub fn value(&self, id: &ValueId) -> Option<&Value> {
        self.values.get(id)
    }

    /// Number of values that had to be synthesized because an update arrived
    /// for a value the node did not track.
    ///
    /// A non-zero count points at lost or reordered upstream messages.
    #[must_use]
    pub fn recovered_value_count(&self) -> u64 {
        self.recovered_values
    }

    /// Returns the node id.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Position of the node in the server's node list.
    #[must_use]
    pub fn index(&self) -> Option<u64> {
        self.u64_field("index")
    }

    /// Z-Wave Plus icon shown to installers.
    #[must_use]
    pub fn installer_icon(&self) -> Option<u64> {
        self.u64_field("installerIcon")
    }

    /// Z-Wave Plus icon shown to end users.
    #[must_use]
    pub fn user_icon(&self) -> Option<u64> {
        self.u64_field("userIcon")
    }

    /// Reachability status. Absent or unrecognized reports read as `Unknown`.
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        self.u64_field("status")
            .map_or(NodeStatus::Unknown, NodeStatus::from_num)
    }

    /// Whether the interview has progressed far enough to use the node.
    #[must_use]
    pub fn ready(&self) -> Option<bool> {
        self.bool_field("ready")
    }

    /// Returns the basic, generic and specific device class.
    #[must_use]
    pub fn device_class(&self) -> DeviceClass<'_> {
        DeviceClass::new(self.object_field("deviceClass"))
    }

    /// Whether the node keeps its receiver always on.
    #[must_use]
    pub fn is_listening(&self) -> Option<bool> {
        self.bool_field("isListening")
    }

    /// Whether the node wakes on beams (FLiRS).
    #[must_use]
    pub fn is_frequent_listening(&self) -> Option<bool> {
        self.bool_field("isFrequentListening")
    }

    /// Whether the node forwards frames for other nodes.
    #[must_use]
    pub fn is_routing(&self) -> Option<bool> {
        self.bool_field("isRouting")
    }

    /// Highest supported data rate in bit/s.
    #[must_use]
    pub fn max_baud_rate(&self) -> Option<u64> {
        self.u64_field("maxBaudRate")
    }

    /// Whether the node was included securely.
    #[must_use]
    pub fn is_secure(&self) -> Option<bool> {
        self.bool_field("isSecure")
    }

    /// Z-Wave protocol version.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.u64_field("version")
    }

    /// Whether the node can wake FLiRS nodes with a beam.
    #[must_use]
    pub fn is_beaming(&self) -> Option<bool> {
        self.bool_field("isBeaming")
    }

    /// Manufacturer id from the Manufacturer Specific CC.
    #[must_use]
    pub fn manufacturer_id(&self) -> Option<u64> {
        self.u64_field("manufacturerId")
    }

    /// Product id from the Manufacturer Specific CC.
    #[must_use]
    pub fn product_id(&self) -> Option<u64> {
        self.u64_field("productId")
    }

    /// Product type from the Manufacturer Specific CC.
    #[must_use]
    pub fn product_type(&self) -> Option<u64> {
        self.u64_field("productType")
    }

    /// Firmware version string, e.g. `"5.26"`.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.str_field("firmwareVersion")
    }

    /// Z-Wave Plus version, if the node is Z-Wave Plus.
    #[must_use]
    pub fn zwave_plus_version(&self) -> Option<u64> {
        self.u64_field("zwavePlusVersion")
    }

    /// Z-Wave Plus node type.
    #[must_use]
    pub fn node_type(&self) -> Option<u64> {
        self.u64_field("nodeType")
    }

    /// Z-Wave Plus role type.
    #[must_use]
    pub fn role_type(&self) -> Option<u64> {
        self.u64_field("roleType")
    }

    /// User assigned name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    /// User assigned location.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.str_field("location")
    }

    /// Returns the device database entry.
    #[must_use]
    pub fn device_config(&self) -> DeviceConfig<'_> {
        DeviceConfig::new(self.object_field("deviceConfig"))
    }

    /// Product label from the device database.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.str_field("label")
    }

    /// Ids of the nodes this node can reach directly.
    #[must_use]
    pub fn neighbors(&self) -> Vec<NodeId> {
        self.data
            .get("neighbors")
            .and_then(JsonValue::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(JsonValue::as_u64)
                    .filter_map(|id| NodeId::try_from(id).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether endpoints can appear or disappear at runtime.
    #[must_use]
    pub fn endpoint_count_is_dynamic(&self) -> Option<bool> {
        self.bool_field("endpointCountIsDynamic")
    }

    /// Whether all endpoints support the same command classes.
    #[must_use]
    pub fn endpoints_have_identical_capabilities(&self) -> Option<bool> {
        self.bool_field("endpointsHaveIdenticalCapabilities")
    }

    /// Number of individual endpoints.
    #[must_use]
    pub fn individual_endpoint_count(&self) -> Option<u64> {
        self.u64_field("individualEndpointCount")
    }

    /// Number of aggregated endpoints.
    #[must_use]
    pub fn aggregated_endpoint_count(&self) -> Option<u64> {
        self.u64_field("aggregatedEndpointCount")
    }

    /// How many times the interview was started.
    #[must_use]
    pub fn interview_attempts(&self) -> Option<u64> {
        self.u64_field("interviewAttempts")
    }

    fn u64_field(&self, key: &str) -> Option<u64> {
        self.data.get(key).and_then(JsonValue::as_u64)
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(JsonValue::as_bool)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(JsonValue::as_str)
    }

    fn object_field(&self, key: &str) -> Option<&Map<String, JsonValue>> {
        self.data.get(key).and_then(JsonValue::as_object)
    }
}

impl Subscribable for Node {
    type Listener = NodeListener;

    fn emitter(&self) -> &EventEmitter<NodeListener> {
        &self.emitter
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("node_id", &self.node_id)
            .field("status", &self.status())
            .field("values", &self.values.len())
            .field("recovered_values", &self.recovered_values)
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

fn parse_node_id(data: &Map<String, JsonValue>) -> std::result::Result<NodeId, ParseError> {
    let raw = data
        .get("nodeId")
        .ok_or_else(|| ParseError::MissingField("nodeId".to_string()))?;
    raw.as_u64()
        .and_then(|id| NodeId::try_from(id).ok())
        .ok_or_else(|| ParseError::invalid("nodeId", format!("expected a node id, got {raw}")))
}
