// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `zwave_model` library.
//!
//! Reconciliation failures are reported per event: an error returned from
//! `receive_event` means that single event was rejected and the model was
//! left exactly as it was before the call.

use thiserror::Error;

use crate::node::NodeId;
use crate::value::ValueId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A server message or snapshot could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// An event carried a payload that could not be reconciled.
    ///
    /// Holds the event name and the offending payload so the upstream
    /// message can be identified in logs.
    #[error("malformed `{event}` event: {source} (payload: {payload})")]
    MalformedEvent {
        /// Name of the rejected event.
        event: String,
        /// The payload as JSON text.
        payload: String,
        /// What was wrong with it.
        #[source]
        source: ParseError,
    },

    /// A value was referenced that the node does not track.
    #[error("node {node_id} has no value {value_id}")]
    ValueNotFound {
        /// The node that received the event.
        node_id: NodeId,
        /// The key that was looked up.
        value_id: ValueId,
    },

    /// An event referenced a node the controller does not know.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// Errors related to decoding server payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Unexpected payload shape.
    #[error("unexpected format: {0}")]
    UnexpectedFormat(String),

    /// A field is present but holds a value of the wrong kind.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

impl ParseError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
