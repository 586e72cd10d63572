// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The network controller and event routing.
//!
//! A [`Controller`] owns every [`Node`] of the network. It is the entry
//! point for inbound events: node events are routed to the addressed node,
//! controller events are reconciled against the controller itself (nodes
//! joining and leaving, heal network state, statistics) and re-emitted to
//! the controller's listeners.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use zwave_model::{Controller, Event};
//!
//! let mut controller = Controller::from_json(json!({
//!     "controller": {"homeId": 3_967_834_123_u32, "ownNodeId": 1},
//!     "nodes": [{"nodeId": 1, "values": []}]
//! }))
//! .unwrap();
//!
//! controller.on("node added", |data| {
//!     let node = data.node.expect("node added carries the node");
//!     println!("node {} joined", node.node_id());
//! });
//!
//! let message = r#"{"type": "event", "event": {
//!     "source": "controller",
//!     "event": "node added",
//!     "node": {"nodeId": 8, "values": []}
//! }}"#;
//! controller.receive_event(&Event::from_message(message).unwrap()).unwrap();
//!
//! assert_eq!(controller.nodes().len(), 2);
//! assert!(controller.node(8).is_some());
//! ```

mod event;

pub use event::{
    ControllerEvent, ControllerEventData, InclusionGrant, InclusionState, NvmProgress,
    SecurityClass,
};

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::config::ReconcileConfig;
use crate::error::{Error, ParseError, Result};
use crate::event::{Event, EventBus, NetworkEvent};
use crate::node::{Node, NodeId};
use crate::subscription::{EventEmitter, Subscribable, SubscriptionId};

/// Listener type for controller events.
pub type ControllerListener = dyn for<'a> Fn(&ControllerEventData<'a>) + Send + Sync;

/// What applying a controller event did to the node collection.
enum Applied {
    Untouched,
    /// The node is in the collection under this id.
    Added(NodeId),
    /// The node was taken out of the collection.
    Removed(Node),
}

/// Client-side model of the network controller.
pub struct Controller {
    data: Map<String, JsonValue>,
    nodes: HashMap<NodeId, Node>,
    heal_network_progress: Option<HashMap<NodeId, String>>,
    emitter: EventEmitter<ControllerListener>,
    config: ReconcileConfig,
    bus: Option<EventBus>,
}

impl Controller {
    /// Creates a controller from a server state snapshot.
    ///
    /// `state` holds the controller's own fields under `controller` and the
    /// node snapshots under `nodes`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if `controller` is missing or not an object,
    /// if `nodes` is not a list, or if any node snapshot is rejected.
    pub fn new(mut state: Map<String, JsonValue>) -> Result<Self> {
        let data = match state.remove("controller") {
            Some(JsonValue::Object(data)) => data,
            Some(other) => {
                return Err(ParseError::invalid(
                    "controller",
                    format!("expected an object, got {other}"),
                )
                .into());
            }
            None => return Err(ParseError::MissingField("controller".to_string()).into()),
        };

        let mut nodes = HashMap::new();
        match state.remove("nodes") {
            None | Some(JsonValue::Null) => {}
            Some(JsonValue::Array(list)) => {
                for snapshot in list {
                    let node = Node::from_json(snapshot)?;
                    nodes.insert(node.node_id(), node);
                }
            }
            Some(other) => {
                return Err(
                    ParseError::invalid("nodes", format!("expected a list, got {other}")).into(),
                );
            }
        }

        tracing::debug!(nodes = nodes.len(), "Created controller from state");

        Ok(Self {
            data,
            nodes,
            heal_network_progress: None,
            emitter: EventEmitter::new(),
            config: ReconcileConfig::default(),
            bus: None,
        })
    }

    /// Creates a controller from a state snapshot given as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if `state` is not an object or is rejected by
    /// [`Controller::new`].
    pub fn from_json(state: JsonValue) -> Result<Self> {
        match state {
            JsonValue::Object(state) => Self::new(state),
            other => Err(ParseError::UnexpectedFormat(format!(
                "controller state must be an object, got {other}"
            ))
            .into()),
        }
    }

    /// Sets the reconciliation settings for the controller and its nodes.
    #[must_use]
    pub fn with_config(mut self, config: ReconcileConfig) -> Self {
        self.config = config;
        for node in self.nodes.values_mut() {
            node.set_config(config);
        }
        self
    }

    /// Publishes a summary of every dispatched controller and node event on
    /// `bus`, including events of nodes added later.
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        for node in self.nodes.values_mut() {
            node.set_event_bus(Some(bus.clone()));
        }
        self.bus = Some(bus);
        self
    }

    /// Registers a listener for the named controller event.
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: Fn(&ControllerEventData<'_>) + Send + Sync + 'static,
    {
        let listener: Arc<ControllerListener> = Arc::new(listener);
        self.emitter.on(event, listener)
    }

    /// Reconciles one inbound event.
    ///
    /// Events whose `source` is `node` are handed to the addressed node's
    /// [`Node::receive_event`]. Everything else is handled as a controller
    /// event and emitted to this controller's listeners.
    ///
    /// # Errors
    ///
    /// - `Error::MalformedEvent` if the event lacks the fields its handling
    ///   needs (including `nodeId` on node events).
    /// - `Error::UnknownNode` for events addressed to a node that is not in
    ///   the collection, when the configuration does not ignore those.
    /// - Any error the addressed node returns.
    pub fn receive_event(&mut self, event: &Event) -> Result<()> {
        match event.source() {
            Some("node") => return self.route_to_node(event),
            Some("controller") => {}
            other => {
                tracing::warn!(
                    source = ?other,
                    event = %event.name(),
                    "Event from unexpected source, handling as controller event"
                );
            }
        }

        let parsed = ControllerEvent::from_event(event).map_err(|source| malformed(event, source))?;
        self.dispatch(&parsed)
    }

    /// Reconciles an already parsed controller event and re-emits it.
    ///
    /// # Errors
    ///
    /// Same as [`Controller::receive_event`], minus routing and parsing
    /// failures of the event itself. A `node added` snapshot that cannot be
    /// turned into a node is reported as `Error::MalformedEvent`.
    pub fn dispatch(&mut self, event: &ControllerEvent) -> Result<()> {
        let applied = self.apply(event)?;

        let node = match &applied {
            Applied::Untouched => None,
            Applied::Added(node_id) => self.nodes.get(node_id),
            Applied::Removed(node) => Some(node),
        };
        let data = ControllerEventData {
            event,
            controller: &*self,
            node,
        };

        let delivered = self.emitter
            .emit_with(event.name(), |listener| listener(&data));

        let subscribers = self.bus.as_ref().map_or(0, |bus| {
            let mut summary = NetworkEvent::controller(event.name());
            if let Some(node) = node {
                summary = summary.with_node(node.node_id());
            }
            bus.publish(summary)
        });
        tracing::trace!(
            event = %event,
            listeners = delivered,
            subscribers,
            "Emitted controller event"
        );

        Ok(())
    }

    fn route_to_node(&mut self, event: &Event) -> Result<()> {
        let node_id = event
            .node_id()
            .ok_or_else(|| malformed(event, ParseError::MissingField("nodeId".to_string())))?;

        match self.nodes.get_mut(&node_id) {
            Some(node) => node.receive_event(event),
            None if self.config.unknown_node_events.is_ignore() => {
                tracing::warn!(node_id, event = %event.name(), "Dropping event for unknown node");
                Ok(())
            }
            None => Err(Error::UnknownNode(node_id)),
        }
    }

    fn apply(&mut self, event: &ControllerEvent) -> Result<Applied> {
        match event {
            ControllerEvent::NodeAdded { snapshot } => self.handle_node_added(snapshot),
            ControllerEvent::NodeRemoved { node_id } => self.handle_node_removed(*node_id),
            ControllerEvent::HealNetworkProgress { progress } => {
                self.heal_network_progress = Some(progress.clone());
                self.data
                    .insert("isHealNetworkActive".to_string(), JsonValue::Bool(true));
                tracing::debug!(nodes = progress.len(), "Heal network progress");
                Ok(Applied::Untouched)
            }
            ControllerEvent::HealNetworkDone => {
                self.heal_network_progress = None;
                self.data
                    .insert("isHealNetworkActive".to_string(), JsonValue::Bool(false));
                tracing::debug!("Heal network done");
                Ok(Applied::Untouched)
            }
            ControllerEvent::StatisticsUpdated { statistics } => {
                self.merge_statistics(statistics);
                Ok(Applied::Untouched)
            }
            ControllerEvent::InclusionFailed
            | ControllerEvent::ExclusionFailed
            | ControllerEvent::InclusionStarted { .. }
            | ControllerEvent::ExclusionStarted
            | ControllerEvent::InclusionStopped
            | ControllerEvent::ExclusionStopped
            | ControllerEvent::ValidateDskAndEnterPin { .. }
            | ControllerEvent::GrantSecurityClasses { .. }
            | ControllerEvent::NvmBackupProgress(_)
            | ControllerEvent::NvmConvertProgress(_)
            | ControllerEvent::NvmRestoreProgress(_) => Ok(Applied::Untouched),
            ControllerEvent::Unknown { name } => {
                tracing::trace!(event = %name, "Unrecognized controller event");
                Ok(Applied::Untouched)
            }
        }
    }

    fn handle_node_added(&mut self, snapshot: &Map<String, JsonValue>) -> Result<Applied> {
        let mut node = match Node::new(snapshot.clone()) {
            Ok(node) => node,
            Err(Error::Parse(source)) => {
                return Err(Error::MalformedEvent {
                    event: "node added".to_string(),
                    payload: JsonValue::Object(snapshot.clone()).to_string(),
                    source,
                });
            }
            Err(other) => return Err(other),
        };
        node.set_config(self.config);
        node.set_event_bus(self.bus.clone());

        let node_id = node.node_id();
        if self.nodes.insert(node_id, node).is_some() {
            tracing::debug!(node_id, "Node added twice, replaced");
        }
        tracing::info!(node_id, "Node added");
        Ok(Applied::Added(node_id))
    }

    fn handle_node_removed(&mut self, node_id: NodeId) -> Result<Applied> {
        if let Some(node) = self.nodes.remove(&node_id) {
            tracing::info!(node_id, "Node removed");
            return Ok(Applied::Removed(node));
        }
        if self.config.unknown_node_events.is_ignore() {
            tracing::warn!(node_id, "Removal of unknown node ignored");
            return Ok(Applied::Untouched);
        }
        Err(Error::UnknownNode(node_id))
    }

    fn merge_statistics(&mut self, update: &Map<String, JsonValue>) {
        let entry = self
            .data
            .entry("statistics")
            .or_insert_with(|| JsonValue::Object(Map::new()));
        match entry {
            JsonValue::Object(statistics) => {
                statistics.extend(update.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            other => *other = JsonValue::Object(update.clone()),
        }
    }

    /// Returns the raw controller fields.
    #[must_use]
    pub fn data(&self) -> &Map<String, JsonValue> {
        &self.data
    }

    /// Returns every node of the network.
    #[must_use]
    pub fn nodes(&self) -> &HashMap<NodeId, Node> {
        &self.nodes
    }

    /// Returns one node by id.
    #[must_use]
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Mutable access to one node, e.g. to feed it events directly.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Returns the reconciliation settings in use.
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Z-Wave library version, e.g. `"Z-Wave 6.07"`.
    #[must_use]
    pub fn library_version(&self) -> Option<&str> {
        self.str_field("libraryVersion")
    }

    /// Controller library type (the server's `type` field).
    #[must_use]
    pub fn controller_type(&self) -> Option<u64> {
        self.u64_field("type")
    }

    /// Network home id.
    #[must_use]
    pub fn home_id(&self) -> Option<u64> {
        self.u64_field("homeId")
    }

    /// Node id of the controller itself.
    #[must_use]
    pub fn own_node_id(&self) -> Option<NodeId> {
        self.u64_field("ownNodeId")
            .and_then(|id| NodeId::try_from(id).ok())
    }

    /// Whether this is a secondary controller.
    #[must_use]
    pub fn is_secondary(&self) -> Option<bool> {
        self.bool_field("isSecondary")
    }

    /// Whether the controller joined another network.
    #[must_use]
    pub fn is_using_home_id_from_other_network(&self) -> Option<bool> {
        self.bool_field("isUsingHomeIdFromOtherNetwork")
    }

    /// Whether the network has a SUC ID server.
    #[must_use]
    pub fn is_sis_present(&self) -> Option<bool> {
        self.bool_field("isSISPresent")
    }

    /// Whether the controller was the primary before joining.
    #[must_use]
    pub fn was_real_primary(&self) -> Option<bool> {
        self.bool_field("wasRealPrimary")
    }

    /// Whether the controller is the SUC.
    #[must_use]
    pub fn is_static_update_controller(&self) -> Option<bool> {
        self.bool_field("isStaticUpdateController")
    }

    /// Whether the controller runs a slave library.
    #[must_use]
    pub fn is_slave(&self) -> Option<bool> {
        self.bool_field("isSlave")
    }

    /// Serial API version string.
    #[must_use]
    pub fn serial_api_version(&self) -> Option<&str> {
        self.str_field("serialApiVersion")
    }

    /// Manufacturer id of the stick.
    #[must_use]
    pub fn manufacturer_id(&self) -> Option<u64> {
        self.u64_field("manufacturerId")
    }

    /// Product type of the stick.
    #[must_use]
    pub fn product_type(&self) -> Option<u64> {
        self.u64_field("productType")
    }

    /// Product id of the stick.
    #[must_use]
    pub fn product_id(&self) -> Option<u64> {
        self.u64_field("productId")
    }

    /// Serial API functions the controller supports.
    #[must_use]
    pub fn supported_function_types(&self) -> Vec<u64> {
        self.data
            .get("supportedFunctionTypes")
            .and_then(JsonValue::as_array)
            .map(|types| types.iter().filter_map(JsonValue::as_u64).collect())
            .unwrap_or_default()
    }

    /// Node id of the static update controller.
    #[must_use]
    pub fn suc_node_id(&self) -> Option<NodeId> {
        self.u64_field("sucNodeId")
            .and_then(|id| NodeId::try_from(id).ok())
    }

    /// Whether the stick supports timer functions.
    #[must_use]
    pub fn supports_timers(&self) -> Option<bool> {
        self.bool_field("supportsTimers")
    }

    /// Whether a network heal is running.
    #[must_use]
    pub fn is_heal_network_active(&self) -> Option<bool> {
        self.bool_field("isHealNetworkActive")
    }

    /// Current inclusion or exclusion state.
    #[must_use]
    pub fn inclusion_state(&self) -> Option<InclusionState> {
        self.u64_field("inclusionState")
            .and_then(InclusionState::from_num)
    }

    /// Per-node status of the running heal, if one is in progress.
    #[must_use]
    pub fn heal_network_progress(&self) -> Option<&HashMap<NodeId, String>> {
        self.heal_network_progress.as_ref()
    }

    /// Controller statistics as last reported.
    #[must_use]
    pub fn statistics(&self) -> Option<&Map<String, JsonValue>> {
        self.data.get("statistics").and_then(JsonValue::as_object)
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
}

impl Subscribable for Controller {
    type Listener = ControllerListener;

    fn emitter(&self) -> &EventEmitter<ControllerListener> {
        &self.emitter
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("home_id", &self.home_id())
            .field("nodes", &self.nodes.len())
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

fn malformed(event: &Event, source: ParseError) -> Error {
    Error::MalformedEvent {
        event: event.name().to_string(),
        payload: event.payload_text(),
        source,
    }
}
