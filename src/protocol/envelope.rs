//! Invalidation Envelope Module
//!
//! The message published on the broadcast channel: which node wrote, and
//! which key every other node must drop. Encoded as self-describing JSON so
//! any subscriber can read it regardless of key contents; envelopes are
//! immutable once published.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// == Invalidation Envelope ==
/// A single invalidation notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Identity of the publishing node, used for self-echo suppression
    pub sender_id: String,
    /// The cache key every other node must delete
    pub key: String,
}

impl Envelope {
    // == Constructor ==
    /// Creates a new envelope for the given sender and key.
    pub fn new(sender_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            key: key.into(),
        }
    }

    // == Encode ==
    /// Serializes the envelope into its wire payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    // == Decode ==
    /// Parses an inbound payload into an envelope.
    ///
    /// A payload that fails to parse is reported to the caller; the
    /// subscriber loop logs and drops it rather than terminating.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}
