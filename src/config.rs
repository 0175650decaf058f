//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Controls when a cache instance announces its writes to peers.
///
/// With `Explicit` (the default), `set` and `delete` are local-only and the
/// caller decides when to pay the broadcast cost by calling `invalidate`.
/// With `OnWrite`, every `set` and `delete` also publishes an invalidation
/// for the written key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Writes stay local; invalidations are sent only via `invalidate`
    #[default]
    Explicit,
    /// Every `set`/`delete` also broadcasts an invalidation
    OnWrite,
}

/// Default TTL for entries inserted without an explicit one: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default cost bound for the local store.
pub const DEFAULT_MAX_COST: u64 = 1 << 30;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Broadcast transport connection string
    pub transport_addr: String,
    /// Broadcast topic shared by all cache instances
    pub channel: String,
    /// Maximum total cost the local store may hold
    pub max_cost: u64,
    /// Sizing hint for the store's internal bookkeeping (entries, not cost)
    pub counters_hint: Option<usize>,
    /// Default TTL applied to entries inserted without an explicit TTL
    pub default_ttl: Duration,
    /// When writes are announced to peers
    pub propagation: Propagation,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_REDIS_ADDR` - Transport connection string (default: redis://127.0.0.1:6379)
    /// - `CACHE_CHANNEL` - Broadcast topic name (default: cache-invalidation)
    /// - `CACHE_MAX_COST` - Local store cost bound (default: 1073741824)
    /// - `CACHE_COUNTERS_HINT` - Store bookkeeping size hint (default: unset)
    /// - `CACHE_DEFAULT_TTL_SECS` - Default entry TTL in seconds (default: 86400)
    /// - `CACHE_PROPAGATION` - `explicit` or `on-write` (default: explicit)
    pub fn from_env() -> Self {
        Self {
            transport_addr: env::var("CACHE_REDIS_ADDR")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            channel: env::var("CACHE_CHANNEL")
                .unwrap_or_else(|_| "cache-invalidation".to_string()),
            max_cost: env::var("CACHE_MAX_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_COST),
            counters_hint: env::var("CACHE_COUNTERS_HINT")
                .ok()
                .and_then(|v| v.parse().ok()),
            default_ttl: env::var("CACHE_DEFAULT_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TTL),
            propagation: match env::var("CACHE_PROPAGATION").as_deref() {
                Ok("on-write") => Propagation::OnWrite,
                _ => Propagation::Explicit,
            },
        }
    }

    /// Returns a config pointing at the given topic, keeping all other defaults.
    ///
    /// Convenience for constructing several instances against a shared channel.
    pub fn with_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            transport_addr: "redis://127.0.0.1:6379".to_string(),
            channel: "cache-invalidation".to_string(),
            max_cost: DEFAULT_MAX_COST,
            counters_hint: None,
            default_ttl: DEFAULT_TTL,
            propagation: Propagation::Explicit,
        }
    }
}
