// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event reconciliation for nodes.
//!
//! Each inbound event goes through the same steps: parse into a
//! [`NodeEvent`], apply it to the node's state, then hand the listeners a
//! [`NodeEventData`] that borrows the updated node and the affected value.
//! Only value events change state; every other kind is a notification whose
//! information is already a projection of the node's snapshot.

use crate::error::{Error, Result};
use crate::event::{Event, NetworkEvent};
use crate::value::{Value, ValueId};

use super::{Node, NodeEvent, NodeEventData, ValueArgs};

/// What applying an event did to the value index.
enum Applied {
    /// No value is attached to the event.
    Untouched,
    /// The value is in the index under this key.
    Tracked(ValueId),
    /// The value was taken out of the index.
    Removed(Value),
    /// The value was built for this event only and never indexed.
    Detached(Value),
}

impl Node {
    /// Reconciles one inbound event and re-emits it to this node's listeners.
    ///
    /// Listeners registered under the event's name run synchronously, after
    /// the node has been updated, and receive a [`NodeEventData`] whose
    /// `node` is this node. Unrecognized event names do not change state but
    /// are still emitted.
    ///
    /// # Errors
    ///
    /// - `Error::MalformedEvent` if the `args` of a `value added`,
    ///   `value updated` or `value removed` event are missing or lack a
    ///   valid identity. `value notification` and `metadata updated` are
    ///   emitted without a value instead.
    /// - `Error::ValueNotFound` for a `value removed` event whose value is
    ///   not tracked, unless the node is configured to ignore those.
    ///
    /// On error the node is left unchanged and nothing is emitted.
    pub fn receive_event(&mut self, event: &Event) -> Result<()> {
        let parsed = NodeEvent::from_event(event).map_err(|source| Error::MalformedEvent {
            event: event.name().to_string(),
            payload: event.payload_text(),
            source,
        })?;
        self.dispatch(&parsed)
    }

    /// Reconciles an already parsed event and re-emits it.
    ///
    /// # Errors
    ///
    /// Same as [`Node::receive_event`], minus parsing failures.
    pub fn dispatch(&mut self, event: &NodeEvent) -> Result<()> {
        let applied = self.apply(event)?;

        let value = match &applied {
            Applied::Untouched => None,
            Applied::Tracked(id) => self.values.get(id),
            Applied::Removed(value) | Applied::Detached(value) => Some(value),
        };
        let data = NodeEventData {
            event,
            node: &*self,
            value,
        };

        let delivered = self.emitter
            .emit_with(event.name(), |listener| listener(&data));

        let subscribers = self.bus.as_ref().map_or(0, |bus| {
            let mut summary = NetworkEvent::node(self.node_id, event.name());
            if let Some(args) = event.value_args() {
                summary = summary.with_value(args.id().clone());
            }
            bus.publish(summary)
        });
        tracing::trace!(
            node_id = self.node_id,
            event = %event.name(),
            listeners = delivered,
            subscribers,
            "Emitted node event"
        );

        Ok(())
    }

    fn apply(&mut self, event: &NodeEvent) -> Result<Applied> {
        match event {
            NodeEvent::WakeUp | NodeEvent::Sleep | NodeEvent::Dead | NodeEvent::Alive => {
                tracing::debug!(node_id = self.node_id, event = %event.name(), "Node status event");
                Ok(Applied::Untouched)
            }
            NodeEvent::InterviewCompleted | NodeEvent::Ready => {
                tracing::debug!(
                    node_id = self.node_id,
                    event = %event.name(),
                    "Node interview event"
                );
                Ok(Applied::Untouched)
            }
            NodeEvent::InterviewFailed { .. } => {
                tracing::warn!(node_id = self.node_id, "Node interview failed");
                Ok(Applied::Untouched)
            }
            NodeEvent::ValueAdded(args) => Ok(self.handle_value_added(args)),
            NodeEvent::ValueUpdated(args) => Ok(self.handle_value_updated(args)),
            NodeEvent::ValueRemoved(args) => self.handle_value_removed(args),
            NodeEvent::ValueNotification(args) => Ok(match args {
                Some(args) => Applied::Detached(args.to_value()),
                None => Applied::Untouched,
            }),
            NodeEvent::MetadataUpdated(args) => Ok(match args {
                Some(args) => self.tracked(args.id()),
                None => Applied::Untouched,
            }),
            NodeEvent::Notification { .. }
            | NodeEvent::FirmwareUpdateProgress { .. }
            | NodeEvent::FirmwareUpdateFinished { .. } => Ok(Applied::Untouched),
            NodeEvent::Unknown { name } => {
                tracing::trace!(node_id = self.node_id, event = %name, "Unrecognized node event");
                Ok(Applied::Untouched)
            }
        }
    }

    fn handle_value_added(&mut self, args: &ValueArgs) -> Applied {
        let id = args.id().clone();
        if self.values.insert(id.clone(), args.to_value()).is_some() {
            tracing::debug!(node_id = self.node_id, value_id = %id, "Value added twice, replaced");
        }
        Applied::Tracked(id)
    }

    fn handle_value_updated(&mut self, args: &ValueArgs) -> Applied {
        let id = args.id().clone();
        if let Some(value) = self.values.get_mut(&id) {
            value.merge_update(args.payload());
        } else {
            self.recovered_values += 1;
            tracing::warn!(
                node_id = self.node_id,
                value_id = %id,
                recovered = self.recovered_values,
                "Update for untracked value, creating it from the update"
            );
            self.values.insert(id.clone(), args.to_value());
        }
        Applied::Tracked(id)
    }

    fn handle_value_removed(&mut self, args: &ValueArgs) -> Result<Applied> {
        if let Some(value) = self.values.remove(args.id()) {
            return Ok(Applied::Removed(value));
        }
        if self.config.missing_value_removal.is_ignore() {
            tracing::debug!(
                node_id = self.node_id,
                value_id = %args.id(),
                "Removal of untracked value ignored"
            );
            return Ok(Applied::Untouched);
        }
        Err(Error::ValueNotFound {
            node_id: self.node_id,
            value_id: args.id().clone(),
        })
    }

    fn tracked(&self, id: &ValueId) -> Applied {
        if self.values.contains_key(id) {
            Applied::Tracked(id.clone())
        } else {
            Applied::Untouched
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::{Value as JsonValue, json};

    use crate::config::{MissingPolicy, ReconcileConfig};
    use crate::error::ParseError;
    use crate::event::EventBus;
    use crate::node::NodeStatus;
    use crate::value::PropertyId;

    use super::*;

    fn node(snapshot: JsonValue) -> Node {
        Node::from_json(snapshot).unwrap()
    }

    fn event(value: JsonValue) -> Event {
        Event::from_json(value).unwrap()
    }

    fn current_value_id() -> ValueId {
        ValueId::new(38, 0, PropertyId::from("currentValue"))
    }

    fn value_event(name: &str, extra: JsonValue) -> Event {
        let mut args = json!({"commandClass": 38, "endpoint": 0, "property": "currentValue"});
        if let (Some(args), Some(extra)) = (args.as_object_mut(), extra.as_object()) {
            args.extend(extra.clone());
        }
        event(json!({"source": "node", "event": name, "nodeId": 5, "args": args}))
    }

    /// Records what listeners saw for each emission.
    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        name: String,
        node_id: u16,
        value: Option<Value>,
    }

    fn record(node: &Node, name: &str) -> Arc<Mutex<Vec<Seen>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        node.on(name, move |data| {
            sink.lock().push(Seen {
                name: data.name().to_string(),
                node_id: data.node.node_id(),
                value: data.value.cloned(),
            });
        });
        seen
    }

    #[test]
    fn add_update_remove_scenario() {
        let mut node = node(json!({"nodeId": 5, "values": []}));
        let added = record(&node, "value added");
        let updated = record(&node, "value updated");
        let removed = record(&node, "value removed");

        node.receive_event(&value_event("value added", json!({})))
            .unwrap();
        assert_eq!(node.values().len(), 1);
        let key = node.values().keys().next().unwrap().to_string();
        assert_eq!(key, "38-0-currentValue");
        assert_eq!(
            added.lock()[0].value.as_ref(),
            node.value(&current_value_id())
        );

        node.receive_event(&value_event("value updated", json!({"newValue": 99})))
            .unwrap();
        assert_eq!(node.values().len(), 1);
        let value = node.value(&current_value_id()).unwrap();
        assert_eq!(value.new_value(), Some(&json!(99)));
        assert_eq!(value.value(), Some(&json!(99)));
        assert_eq!(updated.lock()[0].value.as_ref(), Some(value));

        node.receive_event(&value_event("value removed", json!({})))
            .unwrap();
        assert!(node.values().is_empty());
        let seen = removed.lock();
        let removed_value = seen[0].value.as_ref().unwrap();
        assert_eq!(removed_value.id(), &current_value_id());
        assert_eq!(removed_value.new_value(), Some(&json!(99)));
        assert_eq!(node.recovered_value_count(), 0);
    }

    #[test]
    fn update_preserves_unmentioned_fields() {
        let mut node = node(json!({
            "nodeId": 5,
            "values": [{
                "commandClass": 38,
                "commandClassName": "Multilevel Switch",
                "endpoint": 0,
                "property": "currentValue",
                "metadata": {"type": "number", "max": 99},
                "value": 0
            }]
        }));

        node.receive_event(&value_event(
            "value updated",
            json!({"newValue": 40, "prevValue": 0}),
        ))
        .unwrap();

        let value = node.value(&current_value_id()).unwrap();
        assert_eq!(value.value(), Some(&json!(40)));
        assert_eq!(value.prev_value(), Some(&json!(0)));
        assert_eq!(value.command_class_name(), Some("Multilevel Switch"));
        assert_eq!(value.metadata().max(), Some(99.0));
    }

    #[test]
    fn update_for_untracked_value_recovers() {
        let mut node = node(json!({"nodeId": 5, "values": []}));
        let updated = record(&node, "value updated");

        node.receive_event(&value_event("value updated", json!({"newValue": 7})))
            .unwrap();

        assert_eq!(node.values().len(), 1);
        assert_eq!(node.recovered_value_count(), 1);
        let value = node.value(&current_value_id()).unwrap();
        assert_eq!(value.value(), Some(&json!(7)));
        assert_eq!(updated.lock()[0].value.as_ref(), Some(value));

        // A second update takes the normal path
        node.receive_event(&value_event("value updated", json!({"newValue": 8})))
            .unwrap();
        assert_eq!(node.values().len(), 1);
        assert_eq!(node.recovered_value_count(), 1);
    }

    #[test]
    fn removing_untracked_value_fails_by_default() {
        let mut node = node(json!({
            "nodeId": 5,
            "values": [{"commandClass": 37, "endpoint": 0, "property": "currentValue"}]
        }));
        let removed = record(&node, "value removed");

        let err = node
            .receive_event(&value_event("value removed", json!({})))
            .unwrap_err();

        match err {
            Error::ValueNotFound { node_id, value_id } => {
                assert_eq!(node_id, 5);
                assert_eq!(value_id, current_value_id());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(removed.lock().is_empty());
        assert_eq!(node.values().len(), 1);
    }

    #[test]
    fn removing_untracked_value_can_be_ignored() {
        let mut node = node(json!({"nodeId": 5}))
            .with_config(ReconcileConfig::new().with_missing_value_removal(MissingPolicy::Ignore));
        let removed = record(&node, "value removed");

        node.receive_event(&value_event("value removed", json!({})))
            .unwrap();

        let seen = removed.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].value, None);
        assert_eq!(seen[0].node_id, 5);
    }

    #[test]
    fn malformed_args_are_rejected_without_side_effects() {
        let mut node = node(json!({
            "nodeId": 5,
            "values": [{"commandClass": 38, "endpoint": 0, "property": "currentValue", "value": 1}]
        }));
        let added = record(&node, "value added");

        let err = node
            .receive_event(&event(json!({
                "source": "node",
                "event": "value added",
                "nodeId": 5,
                "args": {"commandClass": 38, "property": "currentValue"}
            })))
            .unwrap_err();

        match err {
            Error::MalformedEvent {
                event,
                payload,
                source,
            } => {
                assert_eq!(event, "value added");
                assert!(payload.contains("\"commandClass\":38"));
                assert!(matches!(source, ParseError::MissingField(f) if f == "endpoint"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(added.lock().is_empty());
        assert_eq!(node.values().len(), 1);

        let err = node
            .receive_event(&event(json!({"event": "value updated", "nodeId": 5})))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedEvent { .. }));
    }

    #[test]
    fn errors_do_not_stop_later_events() {
        let mut node = node(json!({"nodeId": 5}));
        assert!(
            node.receive_event(&value_event("value removed", json!({})))
                .is_err()
        );
        node.receive_event(&value_event("value added", json!({})))
            .unwrap();
        assert_eq!(node.values().len(), 1);
    }

    #[test]
    fn every_event_carries_the_node() {
        let mut node = node(json!({"nodeId": 5, "status": 2}));
        let names = [
            "wake up",
            "sleep",
            "dead",
            "alive",
            "interview completed",
            "interview failed",
            "ready",
            "notification",
            "firmware update progress",
            "firmware update finished",
            "something new",
        ];
        let recorders: Vec<_> = names.iter().map(|name| record(&node, name)).collect();

        for name in names {
            node.receive_event(&event(json!({"source": "node", "event": name, "nodeId": 5})))
                .unwrap();
        }

        for (name, seen) in names.iter().zip(&recorders) {
            let seen = seen.lock();
            assert_eq!(seen.len(), 1, "{name} emitted once");
            assert_eq!(seen[0].name, *name);
            assert_eq!(seen[0].node_id, 5);
            assert_eq!(seen[0].value, None);
        }
        assert_eq!(node.status(), NodeStatus::Awake);
    }

    #[test]
    fn value_notification_attaches_value_without_tracking() {
        let mut node = node(json!({"nodeId": 5}));
        let seen = record(&node, "value notification");

        node.receive_event(&event(json!({
            "source": "node",
            "event": "value notification",
            "nodeId": 5,
            "args": {
                "commandClass": 91,
                "endpoint": 0,
                "property": "scene",
                "propertyKey": "001",
                "value": 0
            }
        })))
        .unwrap();

        assert!(node.values().is_empty());
        let seen = seen.lock();
        let value = seen[0].value.as_ref().unwrap();
        assert_eq!(value.id().to_string(), "91-0-scene-001");
        assert_eq!(value.value(), Some(&json!(0)));
    }

    #[test]
    fn metadata_updated_attaches_tracked_value_only() {
        let mut node = node(json!({
            "nodeId": 5,
            "values": [{"commandClass": 38, "endpoint": 0, "property": "currentValue", "value": 3}]
        }));
        let seen = record(&node, "metadata updated");

        node.receive_event(&value_event(
            "metadata updated",
            json!({"metadata": {"type": "number", "label": "Level"}}),
        ))
        .unwrap();
        node.receive_event(&event(json!({
            "event": "metadata updated",
            "args": {"commandClass": 38, "endpoint": 0, "property": "targetValue"}
        })))
        .unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0].value.as_ref().map(Value::id),
            Some(&current_value_id())
        );
        assert_eq!(seen[1].value, None);
        // No state change: the stored metadata is untouched
        assert!(node.value(&current_value_id()).unwrap().metadata().is_empty());
        assert_eq!(node.values().len(), 1);
    }

    #[test]
    fn notices_without_identity_are_still_emitted() {
        let mut node = node(json!({
            "nodeId": 5,
            "values": [{"commandClass": 38, "endpoint": 0, "property": "currentValue"}]
        }));
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        node.set_event_bus(Some(bus));

        for name in ["value notification", "metadata updated"] {
            let seen = record(&node, name);

            node.receive_event(&event(json!({"event": name, "nodeId": 5})))
                .unwrap();
            node.receive_event(&event(json!({
                "event": name,
                "nodeId": 5,
                "args": {
                    "commandClass": 38,
                    "property": "currentValue",
                    "metadata": {"type": "number"}
                }
            })))
            .unwrap();

            let seen = seen.lock();
            assert_eq!(seen.len(), 2, "{name} emitted for both payloads");
            assert!(seen.iter().all(|s| s.node_id == 5 && s.value.is_none()));
            assert_eq!(rx.try_recv().unwrap(), NetworkEvent::node(5, name));
            assert_eq!(rx.try_recv().unwrap(), NetworkEvent::node(5, name));
        }
        assert_eq!(node.values().len(), 1);
    }

    #[test]
    fn listeners_see_other_names_only_when_registered() {
        let mut node = node(json!({"nodeId": 5}));
        let sleep = record(&node, "sleep");

        node.receive_event(&event(json!({"event": "wake up", "nodeId": 5})))
            .unwrap();
        assert!(sleep.lock().is_empty());
    }

    #[test]
    fn unsubscribed_listeners_are_not_called() {
        use crate::subscription::Subscribable;

        let mut node = node(json!({"nodeId": 5}));
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = node.on("alive", move |_| *sink.lock() += 1);

        node.receive_event(&event(json!({"event": "alive"})))
            .unwrap();
        assert!(node.unsubscribe(id));
        node.receive_event(&event(json!({"event": "alive"})))
            .unwrap();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn dispatch_accepts_parsed_events() {
        let mut node = node(json!({"nodeId": 5}));
        let parsed = NodeEvent::from_event(&value_event("value added", json!({"newValue": 1})))
            .unwrap();
        node.dispatch(&parsed).unwrap();
        assert_eq!(
            node.value(&current_value_id()).and_then(Value::value),
            Some(&json!(1))
        );
    }

    #[test]
    fn publishes_summaries_on_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let mut node = node(json!({"nodeId": 5})).with_event_bus(bus);

        node.receive_event(&value_event("value added", json!({})))
            .unwrap();
        node.receive_event(&event(json!({"event": "sleep"})))
            .unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(
            first,
            NetworkEvent::node(5, "value added").with_value(current_value_id())
        );
        let second = rx.try_recv().unwrap();
        assert_eq!(second, NetworkEvent::node(5, "sleep"));
    }

    #[test]
    fn failed_events_are_not_published() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let mut node = node(json!({"nodeId": 5})).with_event_bus(bus);

        assert!(
            node.receive_event(&value_event("value removed", json!({})))
                .is_err()
        );
        assert!(rx.try_recv().is_err());
    }
}
