// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener registry for named events.
//!
//! This module provides the core types for managing event listeners:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`EventEmitter`] - Registry for storing and invoking listeners by event name

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Unique identifier for a subscription.
///
/// This ID is returned when registering a listener and can be used to
/// unsubscribe later. IDs are unique within an emitter's lifetime.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use zwave_model::subscription::{EventEmitter, PayloadListener};
///
/// let emitter: EventEmitter<PayloadListener<u32>> = EventEmitter::new();
/// let sub_id = emitter.on("tick", Arc::new(|count: &mut u32| *count += 1));
///
/// // Later, unsubscribe
/// assert!(emitter.unsubscribe(sub_id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Listener type for emitters whose payload is handed out mutably.
pub type PayloadListener<P> = dyn Fn(&mut P) + Send + Sync;

struct Registration<L: ?Sized> {
    id: SubscriptionId,
    event: String,
    listener: Arc<L>,
}

/// Registry of listeners keyed by event name.
///
/// `L` is the listener type, usually a `dyn Fn(..) + Send + Sync` trait
/// object. Listeners for a name are invoked synchronously in the order they
/// were registered. Registering the same closure twice creates two
/// independent registrations.
///
/// # Thread Safety
///
/// The registry uses `parking_lot::RwLock` so listeners can be added and
/// removed through a shared reference. Emission snapshots the matching
/// listeners before invoking them, so a listener may register or unregister
/// other listeners; such changes take effect from the next emission.
pub struct EventEmitter<L: ?Sized> {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Registrations in registration order.
    listeners: RwLock<Vec<Registration<L>>>,
}

impl<L: ?Sized> EventEmitter<L> {
    /// Creates a new empty emitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Generates a new unique subscription ID.
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a listener for the named event.
    pub fn on(&self, event: impl Into<String>, listener: Arc<L>) -> SubscriptionId {
        let id = self.next_id();
        self.listeners.write().push(Registration {
            id,
            event: event.into(),
            listener,
        });
        id
    }

    /// Unregisters a listener by its subscription ID.
    ///
    /// Returns `true` if the registration was found and removed. Calling this
    /// again with the same ID is a no-op that returns `false`.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        match listeners.iter().position(|r| r.id == id) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Invokes every listener registered for `event`.
    ///
    /// `invoke` is called once per listener, in registration order, and is
    /// responsible for passing the payload. Returns the number of listeners
    /// invoked; with no listeners this is a no-op returning 0.
    pub fn emit_with(&self, event: &str, mut invoke: impl FnMut(&L)) -> usize {
        let matching: Vec<Arc<L>> = self
            .listeners
            .read()
            .iter()
            .filter(|r| r.event == event)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in &matching {
            invoke(listener);
        }
        matching.len()
    }

    /// Returns the number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|r| r.event == event)
            .count()
    }

    /// Returns the total number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns `true` if there are no registered listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all listeners.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }
}

impl<P: ?Sized> EventEmitter<PayloadListener<P>> {
    /// Invokes every listener registered for `event` with `payload`.
    ///
    /// Changes a listener makes to the payload are visible to the listeners
    /// after it and to the caller once this returns.
    pub fn emit(&self, event: &str, payload: &mut P) -> usize {
        self.emit_with(event, |listener| listener(&mut *payload))
    }
}

impl<L: ?Sized> Default for EventEmitter<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> std::fmt::Debug for EventEmitter<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listener_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    type Emitter = EventEmitter<PayloadListener<Vec<&'static str>>>;

    #[test]
    fn subscription_id_display() {
        let id = SubscriptionId::new(42);
        assert_eq!(id.to_string(), "Sub(42)");
    }

    #[test]
    fn subscription_id_hash() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(SubscriptionId::new(1));
        set.insert(SubscriptionId::new(2));
        set.insert(SubscriptionId::new(1)); // Duplicate

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn new_is_empty() {
        let emitter = Emitter::new();
        assert!(emitter.is_empty());
        assert_eq!(emitter.len(), 0);
    }

    #[test]
    fn emit_without_listeners_is_noop() {
        let emitter = Emitter::new();
        let mut payload = vec![];
        assert_eq!(emitter.emit("value added", &mut payload), 0);
        assert!(payload.is_empty());
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let emitter = Emitter::new();
        emitter.on("ready", Arc::new(|p: &mut Vec<&'static str>| p.push("first")));
        emitter.on("ready", Arc::new(|p: &mut Vec<&'static str>| p.push("second")));
        emitter.on("ready", Arc::new(|p: &mut Vec<&'static str>| p.push("third")));

        let mut payload = vec![];
        assert_eq!(emitter.emit("ready", &mut payload), 3);
        assert_eq!(payload, vec!["first", "second", "third"]);
    }

    #[test]
    fn mutations_visible_to_later_listeners_and_caller() {
        let emitter = Emitter::new();
        emitter.on("ready", Arc::new(|p: &mut Vec<&'static str>| p.push("seen")));
        emitter.on(
            "ready",
            Arc::new(|p: &mut Vec<&'static str>| {
                assert_eq!(p.as_slice(), ["seen"]);
                p.push("after");
            }),
        );

        let mut payload = vec![];
        emitter.emit("ready", &mut payload);
        assert_eq!(payload, vec!["seen", "after"]);
    }

    #[test]
    fn other_event_names_not_invoked() {
        let emitter = Emitter::new();
        emitter.on("dead", Arc::new(|p: &mut Vec<&'static str>| p.push("dead")));

        let mut payload = vec![];
        assert_eq!(emitter.emit("alive", &mut payload), 0);
        assert!(payload.is_empty());
        assert_eq!(emitter.listener_count("dead"), 1);
        assert_eq!(emitter.listener_count("alive"), 0);
    }

    #[test]
    fn same_listener_registered_twice() {
        let emitter: EventEmitter<PayloadListener<u32>> = EventEmitter::new();
        let listener: Arc<PayloadListener<u32>> = Arc::new(|count: &mut u32| *count += 1);

        let first = emitter.on("tick", Arc::clone(&listener));
        let second = emitter.on("tick", listener);
        assert_ne!(first, second);

        let mut count = 0;
        emitter.emit("tick", &mut count);
        assert_eq!(count, 2);

        // Removing one registration leaves the other in place
        assert!(emitter.unsubscribe(first));
        emitter.emit("tick", &mut count);
        assert_eq!(count, 3);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let emitter: EventEmitter<PayloadListener<u32>> = EventEmitter::new();
        let id = emitter.on("tick", Arc::new(|count: &mut u32| *count += 1));

        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));

        let mut count = 0;
        emitter.emit("tick", &mut count);
        assert_eq!(count, 0);
    }

    #[test]
    fn unsubscribe_nonexistent() {
        let emitter = Emitter::new();
        assert!(!emitter.unsubscribe(SubscriptionId::new(999)));
    }

    #[test]
    fn unsubscribe_is_not_retroactive() {
        let emitter: EventEmitter<PayloadListener<u32>> = EventEmitter::new();
        let id = emitter.on("tick", Arc::new(|count: &mut u32| *count += 1));

        let mut count = 0;
        emitter.emit("tick", &mut count);
        emitter.unsubscribe(id);
        emitter.emit("tick", &mut count);
        assert_eq!(count, 1);
    }

    #[test]
    fn listener_may_register_during_emit() {
        let emitter: Arc<EventEmitter<dyn Fn() + Send + Sync>> = Arc::new(EventEmitter::new());
        let calls = Arc::new(AtomicU32::new(0));

        let inner = Arc::clone(&emitter);
        let inner_calls = Arc::clone(&calls);
        emitter.on(
            "grow",
            Arc::new(move || {
                let c = Arc::clone(&inner_calls);
                inner.on(
                    "grow",
                    Arc::new(move || {
                        c.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        // The listener added during the first emission only runs on the next one
        assert_eq!(emitter.emit_with("grow", |l| l()), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.emit_with("grow", |l| l()), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unique_ids() {
        let emitter = Emitter::new();
        let id1 = emitter.on("a", Arc::new(|_: &mut Vec<&'static str>| {}));
        let id2 = emitter.on("b", Arc::new(|_: &mut Vec<&'static str>| {}));
        assert_ne!(id1, id2);
        assert_ne!(id1.value(), id2.value());
    }

    #[test]
    fn clear() {
        let emitter = Emitter::new();
        emitter.on("a", Arc::new(|_: &mut Vec<&'static str>| {}));
        emitter.on("b", Arc::new(|_: &mut Vec<&'static str>| {}));
        assert_eq!(emitter.len(), 2);

        emitter.clear();
        assert!(emitter.is_empty());
    }

    #[test]
    fn debug() {
        let emitter = Emitter::new();
        emitter.on("a", Arc::new(|_: &mut Vec<&'static str>| {}));

        let debug = format!("{emitter:?}");
        assert!(debug.contains("EventEmitter"));
        assert!(debug.contains("listener_count"));
    }
}
