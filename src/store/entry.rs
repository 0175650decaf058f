//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with cost and TTL
//! metadata.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and admission metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Admission weight charged against the store's cost bound
    pub cost: u32,
    /// Insertion timestamp
    pub created_at: Instant,
    /// Expiration deadline, None when the TTL overflows the clock
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `cost` - Admission weight (1 for unweighted entries)
    /// * `ttl` - Time the entry stays visible after insertion
    pub fn new(value: V, cost: u32, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            cost,
            created_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline; an
    /// entry is never visible to `get` at or past that point.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if the entry has no deadline.
    ///
    /// Returns a zero duration once the entry has expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}
