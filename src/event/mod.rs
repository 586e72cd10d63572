// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound events and async fan-out.
//!
//! - [`Event`] is one inbound protocol event, decoded from a server message.
//! - [`EventBus`] broadcasts an owned [`NetworkEvent`] summary of every
//!   reconciled event to async subscribers.
//!
//! # Examples
//!
//! ```
//! use zwave_model::event::{Event, EventBus, NetworkEvent};
//!
//! let event = Event::from_message(
//!     r#"{"type": "event", "event": {"source": "node", "event": "alive", "nodeId": 2}}"#,
//! )
//! .unwrap();
//! assert_eq!(event.name(), "alive");
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//! bus.publish(NetworkEvent::node(2, "alive"));
//! assert!(rx.try_recv().is_ok());
//! ```

mod event_bus;
mod network_event;
mod raw_event;

pub use event_bus::EventBus;
pub use network_event::NetworkEvent;
pub use raw_event::Event;
