//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.
//!
//! Only the network-facing operations (construction and `invalidate`) can
//! fail. Purely local operations never error: a `get` miss is `None`, a
//! `set` that is not admitted is silent, and `delete` of an absent key is a
//! no-op.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to connect to the broadcast transport at construction time
    #[error("Transport connect failed: {0}")]
    Connect(String),

    /// Failed to establish the broadcast subscription at construction time
    #[error("Subscribe failed: {0}")]
    Subscribe(String),

    /// Failed to publish an invalidation envelope
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Failed to encode or decode an invalidation envelope
    #[error("Malformed invalidation envelope: {0}")]
    Decode(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
