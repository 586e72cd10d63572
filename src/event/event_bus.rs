// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast of reconciled event summaries.

use tokio::sync::broadcast;

use super::NetworkEvent;

/// Summaries buffered per subscriber before the oldest are dropped.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out of [`NetworkEvent`] summaries to async consumers.
///
/// Listeners registered with `on` run inline and borrow the live model. The
/// bus is for consumers that live elsewhere, typically tokio tasks: each
/// receiver gets an owned copy of every summary published after it
/// subscribed.
///
/// Attach a bus with [`Controller::with_event_bus`](crate::Controller::with_event_bus)
/// and the controller, its nodes and any node added later publish one
/// summary per successfully reconciled event. Failed events publish nothing.
///
/// A receiver more than the channel capacity behind loses the oldest
/// summaries and sees `RecvError::Lagged` on its next `recv`.
///
/// # Examples
///
/// ```
/// use zwave_model::event::{EventBus, NetworkEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// assert_eq!(bus.publish(NetworkEvent::node(5, "wake up")), 1);
/// assert_eq!(rx.try_recv().unwrap().node_id(), Some(5));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<NetworkEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to 256 summaries per receiver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` summaries per receiver.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for summaries published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends a summary to every live receiver and returns how many there were.
    ///
    /// With no receivers the summary is dropped and `0` is returned.
    pub fn publish(&self, event: NetworkEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{PropertyId, ValueId};

    #[test]
    fn publish_reports_receivers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(NetworkEvent::node(1, "alive")), 0);

        let rx = bus.subscribe();
        let _other = bus.subscribe();
        assert_eq!(
            bus.publish(NetworkEvent::controller("inclusion started")),
            2
        );

        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(
            bus.publish(NetworkEvent::controller("inclusion stopped")),
            1
        );
    }

    #[test]
    fn receivers_only_see_later_summaries() {
        let bus = EventBus::new();
        bus.publish(NetworkEvent::node(3, "sleep"));

        let mut rx = bus.subscribe();
        bus.publish(NetworkEvent::node(3, "wake up"));

        assert_eq!(rx.try_recv().unwrap().name(), "wake up");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn every_receiver_gets_its_own_copy() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let summary = NetworkEvent::node(7, "value updated")
            .with_value(ValueId::new(38, 0, PropertyId::from("currentValue")));

        bus.publish(summary.clone());

        assert_eq!(rx1.recv().await.unwrap(), summary);
        assert_eq!(rx2.recv().await.unwrap(), summary);
    }

    #[test]
    fn slow_receivers_lag() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();
        for name in ["dead", "alive", "dead"] {
            bus.publish(NetworkEvent::node(4, name));
        }

        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert_eq!(rx.try_recv().unwrap().name(), "alive");
    }

    #[test]
    fn clones_share_the_channel() {
        let bus = EventBus::with_capacity(16);
        let clone = bus.clone();

        let mut rx = bus.subscribe();
        assert_eq!(clone.subscriber_count(), 1);
        clone.publish(NetworkEvent::controller("heal network done"));
        assert_eq!(rx.try_recv().unwrap().name(), "heal network done");
    }
}
