// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for entities that re-emit protocol events.

use crate::subscription::{EventEmitter, SubscriptionId};

/// Trait for entities that publish the events they receive.
///
/// Both [`Node`](crate::Node) and [`Controller`](crate::Controller)
/// implement it. Registration itself stays on the entity (`on`), since each
/// entity hands its listeners a differently shaped payload; this trait covers
/// the parts that are the same everywhere.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use zwave_model::Node;
/// use zwave_model::subscription::Subscribable;
///
/// let node = Node::from_json(json!({"nodeId": 5, "values": []})).unwrap();
/// let sub_id = node.on("wake up", |data| {
///     println!("node {:?} woke up", data.node.node_id());
/// });
///
/// assert_eq!(node.listener_count("wake up"), 1);
/// assert!(node.unsubscribe(sub_id));
/// ```
pub trait Subscribable {
    /// The listener type stored by the entity's emitter.
    type Listener: ?Sized;

    /// Returns the entity's listener registry.
    fn emitter(&self) -> &EventEmitter<Self::Listener>;

    /// Unsubscribes a listener by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.emitter().unsubscribe(id)
    }

    /// Returns the number of listeners registered for `event`.
    fn listener_count(&self, event: &str) -> usize {
        self.emitter().listener_count(event)
    }
}
