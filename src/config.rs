// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation settings.

/// What to do when an event references an entity that is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Reject the event with an error. Nothing is mutated or emitted.
    #[default]
    Fail,
    /// Log the event and carry on as if the entity had been there.
    Ignore,
}

impl MissingPolicy {
    /// Returns `true` if missing entities are tolerated.
    #[must_use]
    pub fn is_ignore(self) -> bool {
        matches!(self, Self::Ignore)
    }
}

/// Settings for how nodes and the controller reconcile inbound events.
///
/// # Examples
///
/// ```
/// use zwave_model::config::{MissingPolicy, ReconcileConfig};
///
/// // Defaults: unknown value removals fail, events for unknown nodes are dropped
/// let config = ReconcileConfig::default();
/// assert_eq!(config.missing_value_removal, MissingPolicy::Fail);
/// assert_eq!(config.unknown_node_events, MissingPolicy::Ignore);
///
/// // Tolerate value removals the model never saw being added
/// let lenient = ReconcileConfig::new().with_missing_value_removal(MissingPolicy::Ignore);
/// assert!(lenient.missing_value_removal.is_ignore());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileConfig {
    /// Policy for `value removed` events whose value is not tracked.
    pub missing_value_removal: MissingPolicy,
    /// Policy for node events (and `node removed`) addressed to a node the
    /// controller does not know.
    pub unknown_node_events: MissingPolicy,
}

impl ReconcileConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that tolerates every missing entity.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            missing_value_removal: MissingPolicy::Ignore,
            unknown_node_events: MissingPolicy::Ignore,
        }
    }

    /// Creates a configuration that rejects every missing entity.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            missing_value_removal: MissingPolicy::Fail,
            unknown_node_events: MissingPolicy::Fail,
        }
    }

    /// Sets the policy for removals of untracked values.
    #[must_use]
    pub fn with_missing_value_removal(mut self, policy: MissingPolicy) -> Self {
        self.missing_value_removal = policy;
        self
    }

    /// Sets the policy for events addressed to unknown nodes.
    #[must_use]
    pub fn with_unknown_node_events(mut self, policy: MissingPolicy) -> Self {
        self.unknown_node_events = policy;
        self
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            missing_value_removal: MissingPolicy::Fail,
            unknown_node_events: MissingPolicy::Ignore,
        }
    }
}
