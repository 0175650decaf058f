//! Cache Sync - distributed local-cache invalidation
//!
//! Each process keeps a private in-memory cache for low-latency reads while
//! a shared broadcast channel propagates invalidation notices, so every
//! process's cache reflects writes made by any other process.
//!
//! Reads never touch the network; writes are local; `invalidate` is the one
//! operation that broadcasts. Consistency is eventual: per-sender delivery
//! order only, at-most-once delivery, and a process that was not listening
//! at publish time simply serves stale data until the entry's TTL elapses.
//!
//! # Example
//!
//! ```no_run
//! use cache_sync::{Cache, CacheConfig};
//!
//! # async fn run() -> cache_sync::Result<()> {
//! let cache: Cache<String> = Cache::new(CacheConfig::from_env()).await?;
//!
//! cache.set("user:1", "profile".to_string()).await?;
//! assert_eq!(cache.get("user:1"), Some("profile".to_string()));
//!
//! // Tell every other process to drop its copy of the key.
//! cache.invalidate("user:1").await?;
//!
//! cache.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod store;
pub mod transport;

pub use cache::Cache;
pub use config::{CacheConfig, Propagation, DEFAULT_MAX_COST, DEFAULT_TTL};
pub use error::{CacheError, Result};
pub use identity::NodeId;
pub use protocol::Envelope;
pub use store::{CacheStats, LocalStore, DEFAULT_COST};
pub use transport::{Broadcast, LocalBroadcast, RedisBroadcast, Subscription};
