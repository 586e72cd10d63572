// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `zwave_model` - Client-side model of a Z-Wave JS network.
//!
//! A Z-Wave JS server pushes an unordered stream of events describing what
//! happens on the network. This library keeps a local model of the
//! controller, its nodes and their values consistent with that stream, and
//! re-emits every event, enriched with the affected entities, to listeners
//! registered on the model.
//!
//! The transport is up to you: hand each inbound message to
//! [`Event::from_message`] and the result to [`Controller::receive_event`].
//!
//! # Supported Features
//!
//! - **Value reconciliation**: values are added, merged field by field on
//!   update, and removed as the server reports them
//! - **Recovery**: updates for values the model never saw recreate them,
//!   with a warning and a per-node counter
//! - **Typed events**: node and controller events are parsed into sum types
//!   before they are applied
//! - **Listeners**: synchronous, in registration order, with
//!   [`SubscriptionId`] handles for unsubscribing
//! - **Async fan-out**: an optional [`EventBus`](event::EventBus) broadcasts a
//!   summary of every reconciled event to tokio tasks
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use zwave_model::{Controller, Event, ValueId};
//! use zwave_model::value::PropertyId;
//!
//! # fn main() -> zwave_model::Result<()> {
//! let mut controller = Controller::from_json(json!({
//!     "controller": {"homeId": 3_601_639_587_u32, "ownNodeId": 1},
//!     "nodes": [
//!         {"nodeId": 1, "values": []},
//!         {
//!             "nodeId": 52,
//!             "values": [
//!                 {"commandClass": 32, "endpoint": 0, "property": "currentValue", "value": 0}
//!             ]
//!         }
//!     ]
//! }))?;
//!
//! if let Some(node) = controller.node(52) {
//!     node.on("value updated", |data| {
//!         if let Some(value) = data.value {
//!             println!("node {} {} = {:?}", data.node.node_id(), value.id(), value.value());
//!         }
//!     });
//! }
//!
//! let message = r#"{
//!     "type": "event",
//!     "event": {
//!         "source": "node",
//!         "event": "value updated",
//!         "nodeId": 52,
//!         "args": {
//!             "commandClassName": "Basic",
//!             "commandClass": 32,
//!             "endpoint": 0,
//!             "property": "currentValue",
//!             "newValue": 255,
//!             "prevValue": 0,
//!             "propertyName": "currentValue"
//!         }
//!     }
//! }"#;
//! controller.receive_event(&Event::from_message(message)?)?;
//!
//! let id = ValueId::new(32, 0, PropertyId::from("currentValue"));
//! let value = controller.node(52).and_then(|node| node.value(&id));
//! assert_eq!(value.and_then(|v| v.value()), Some(&json!(255)));
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Every event is an isolated unit of work. An event that fails
//! reconciliation returns an [`Error`] and leaves the model exactly as it
//! was; later events are processed normally. How events referencing
//! untracked entities are treated is set with
//! [`ReconcileConfig`](config::ReconcileConfig).

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod node;
pub mod subscription;
pub mod value;

pub use config::{MissingPolicy, ReconcileConfig};
pub use controller::{Controller, ControllerEvent, ControllerEventData};
pub use error::{Error, ParseError, Result};
pub use event::{Event, EventBus, NetworkEvent};
pub use node::{Node, NodeEvent, NodeEventData, NodeId, NodeStatus};
pub use subscription::{EventEmitter, Subscribable, SubscriptionId};
pub use value::{PropertyId, Value, ValueId};
