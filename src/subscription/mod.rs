// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for reconciled protocol events.
//!
//! Every entity that receives protocol events re-emits them, after updating
//! its own state, to the listeners registered on it.
//!
//! # Overview
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`EventEmitter`] - Registry that stores listeners by event name and invokes them
//! - [`Subscribable`] - Trait for entities that expose an emitter
//!
//! Delivery is synchronous: by the time `receive_event` returns, every
//! listener for that event has run, in registration order.
//!
//! # Usage
//!
//! ```
//! use serde_json::json;
//! use zwave_model::{Event, Node};
//!
//! let mut node = Node::from_json(json!({"nodeId": 5, "values": []})).unwrap();
//! node.on("value added", |data| {
//!     let value = data.value.expect("value events carry the value");
//!     println!("node {:?} gained {}", data.node.node_id(), value.id());
//! });
//!
//! let event = Event::from_json(json!({
//!     "source": "node",
//!     "event": "value added",
//!     "nodeId": 5,
//!     "args": {"commandClass": 38, "endpoint": 0, "property": "currentValue"}
//! }))
//! .unwrap();
//! node.receive_event(&event).unwrap();
//! ```

mod emitter;
mod subscribable;

pub use emitter::{EventEmitter, PayloadListener, SubscriptionId};
pub use subscribable::Subscribable;
