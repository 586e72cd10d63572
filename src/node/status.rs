// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node reachability status.

use std::fmt;

/// Reachability status of a node as reported by the server.
///
/// # Examples
///
/// ```
/// use zwave_model::node::NodeStatus;
///
/// assert_eq!(NodeStatus::from_num(1), NodeStatus::Asleep);
/// assert_eq!(NodeStatus::Alive.as_str(), "alive");
/// assert_eq!(NodeStatus::from_num(42), NodeStatus::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeStatus {
    /// Not yet determined, or not reported.
    #[default]
    Unknown,
    /// Battery device that is sleeping.
    Asleep,
    /// Battery device that is awake.
    Awake,
    /// Failed to respond.
    Dead,
    /// Mains-powered device that responds.
    Alive,
}

impl NodeStatus {
    /// Converts the server's numeric status. Unrecognized numbers map to `Unknown`.
    #[must_use]
    pub const fn from_num(value: u64) -> Self {
        match value {
            1 => Self::Asleep,
            2 => Self::Awake,
            3 => Self::Dead,
            4 => Self::Alive,
            _ => Self::Unknown,
        }
    }

    /// Returns the numeric status used on the wire.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Asleep => 1,
            Self::Awake => 2,
            Self::Dead => 3,
            Self::Alive => 4,
        }
    }

    /// Returns the lowercase status name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Asleep => "asleep",
            Self::Awake => "awake",
            Self::Dead => "dead",
            Self::Alive => "alive",
        }
    }

    /// Returns `true` if the node can currently be reached.
    #[must_use]
    pub const fn is_reachable(&self) -> bool {
        matches!(self, Self::Awake | Self::Alive)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
