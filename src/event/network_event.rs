// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Owned event summaries for asynchronous consumers.

use crate::node::NodeId;
use crate::value::ValueId;

/// Summary of one reconciled event, published on the [`EventBus`](super::EventBus).
///
/// Synchronous listeners receive borrowed views of the live node and value.
/// Tasks that cannot borrow the model get this owned summary instead and
/// read whatever else they need from the model afterwards.
///
/// # Examples
///
/// ```
/// use zwave_model::event::NetworkEvent;
/// use zwave_model::value::{PropertyId, ValueId};
///
/// let event = NetworkEvent::node(5, "value added")
///     .with_value(ValueId::new(38, 0, PropertyId::from("currentValue")));
///
/// assert_eq!(event.name(), "value added");
/// assert_eq!(event.node_id(), Some(5));
/// assert!(event.is_node());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A node event was reconciled.
    Node {
        /// The node that received the event.
        node_id: NodeId,
        /// The event name.
        event: String,
        /// The affected value, for value events.
        value_id: Option<ValueId>,
    },

    /// A controller event was reconciled.
    Controller {
        /// The event name.
        event: String,
        /// The node added or removed, for node lifecycle events.
        node_id: Option<NodeId>,
    },
}

impl NetworkEvent {
    /// Creates a node event summary.
    #[must_use]
    pub fn node(node_id: NodeId, event: impl Into<String>) -> Self {
        Self::Node {
            node_id,
            event: event.into(),
            value_id: None,
        }
    }

    /// Creates a controller event summary.
    #[must_use]
    pub fn controller(event: impl Into<String>) -> Self {
        Self::Controller {
            event: event.into(),
            node_id: None,
        }
    }

    /// Attaches the affected value. Ignored for controller events.
    #[must_use]
    pub fn with_value(mut self, id: ValueId) -> Self {
        if let Self::Node { value_id, .. } = &mut self {
            *value_id = Some(id);
        }
        self
    }

    /// Attaches the affected node. Ignored for node events.
    #[must_use]
    pub fn with_node(mut self, id: NodeId) -> Self {
        if let Self::Controller { node_id, .. } = &mut self {
            *node_id = Some(id);
        }
        self
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Node { event, .. } | Self::Controller { event, .. } => event,
        }
    }

    /// Returns the node the event concerns, if any.
    #[must_use]
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Node { node_id, .. } => Some(*node_id),
            Self::Controller { node_id, .. } => *node_id,
        }
    }

    /// Returns the affected value, if any.
    #[must_use]
    pub fn value_id(&self) -> Option<&ValueId> {
        match self {
            Self::Node { value_id, .. } => value_id.as_ref(),
            Self::Controller { .. } => None,
        }
    }

    /// Returns `true` if this summarizes a node event.
    #[must_use]
    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node { .. })
    }

    /// Returns `true` if this summarizes a controller event.
    #[must_use]
    pub fn is_controller(&self) -> bool {
        matches!(self, Self::Controller { .. })
    }
}
