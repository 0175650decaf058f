//! Cache Façade Module
//!
//! The public entry point composing the local store with the invalidation
//! protocol. Each `Cache` is an explicitly owned instance: it holds its own
//! identity, store, transport handle, and subscriber task, so independent
//! instances can be constructed against independent or shared channels.
//!
//! `get`, `set`, and `delete` are local-only; `invalidate` is the one
//! operation with a network side effect. A writer keeps serving its own
//! value after invalidating, while every peer on the channel drops theirs.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{CacheConfig, Propagation};
use crate::error::Result;
use crate::identity::NodeId;
use crate::protocol::{spawn_subscriber, Envelope};
use crate::store::{CacheStats, LocalStore, DEFAULT_COST};
use crate::transport::{Broadcast, RedisBroadcast};

/// Upper bound on how long shutdown waits for the subscriber to exit
/// before aborting it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// == Cache ==
/// A process-local cache kept coherent with its peers through broadcast
/// invalidation.
///
/// Reads are served from the local store and never touch the network.
/// Writes are local too; a writer announces them to peers with
/// [`invalidate`](Cache::invalidate) (or automatically, under
/// [`Propagation::OnWrite`]). Consistency across processes is eventual:
/// per-sender delivery order only, no global ordering.
pub struct Cache<V> {
    id: NodeId,
    store: LocalStore<V>,
    transport: Arc<dyn Broadcast>,
    channel: String,
    default_ttl: Duration,
    propagation: Propagation,
    shutdown: CancellationToken,
    subscriber: Mutex<Option<JoinHandle<()>>>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache connected to the Redis channel named in `config`.
    ///
    /// Connects the transport, generates this instance's identity, and
    /// starts the invalidation subscriber. A transport failure here
    /// surfaces as an error and no instance is returned.
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let transport = RedisBroadcast::connect(&config.transport_addr).await?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    // == Constructor With Transport ==
    /// Creates a cache on an already-constructed broadcast transport.
    ///
    /// Instances sharing a transport and channel invalidate each other;
    /// tests and single-host setups typically pass clones of a
    /// [`LocalBroadcast`](crate::transport::LocalBroadcast).
    pub async fn with_transport(
        config: CacheConfig,
        transport: Arc<dyn Broadcast>,
    ) -> Result<Self> {
        let store = LocalStore::new(config.max_cost, config.counters_hint);
        let id = NodeId::generate();

        let subscription = transport.subscribe(&config.channel).await?;
        let shutdown = CancellationToken::new();
        let subscriber =
            spawn_subscriber(store.clone(), id.clone(), subscription, shutdown.clone());

        info!("Cache node {} subscribed to channel {:?}", id, config.channel);

        Ok(Self {
            id,
            store,
            transport,
            channel: config.channel,
            default_ttl: config.default_ttl,
            propagation: config.propagation,
            shutdown,
            subscriber: Mutex::new(Some(subscriber)),
        })
    }

    // == Get ==
    /// Retrieves a value from the local store.
    ///
    /// Never broadcasts and never blocks on the network. Returns None on
    /// miss or expiry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.get(key)
    }

    // == Set ==
    /// Stores a value locally with the default cost and TTL.
    ///
    /// Under [`Propagation::Explicit`] (the default) nothing is broadcast;
    /// the caller announces the write with [`invalidate`](Cache::invalidate)
    /// when peers should drop their copies. Under [`Propagation::OnWrite`]
    /// an invalidation for the key is published as well.
    pub async fn set(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.set_with(key, value, DEFAULT_COST, self.default_ttl).await
    }

    // == Set With ==
    /// Stores a value locally with an explicit cost and TTL.
    ///
    /// Admission is advisory: the store may drop the entry under cost
    /// pressure without reporting it, so a just-written key is not
    /// guaranteed retrievable.
    pub async fn set_with(
        &self,
        key: impl Into<String>,
        value: V,
        cost: u32,
        ttl: Duration,
    ) -> Result<()> {
        let key = key.into();
        self.store.set(key.clone(), value, cost, ttl);
        if self.propagation == Propagation::OnWrite {
            self.publish_invalidation(&key).await?;
        }
        Ok(())
    }

    // == Delete ==
    /// Removes a key from the local store. Idempotent.
    ///
    /// Broadcasts only under [`Propagation::OnWrite`], mirroring `set`.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key);
        if self.propagation == Propagation::OnWrite {
            self.publish_invalidation(key).await?;
        }
        Ok(())
    }

    // == Invalidate ==
    /// Publishes an invalidation notice for `key` to every peer on the
    /// channel.
    ///
    /// Does not touch the local store: the caller holds the authoritative
    /// copy and wants every other process to drop theirs. A publish failure
    /// is returned to the caller and never retried internally.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        self.publish_invalidation(key).await
    }

    async fn publish_invalidation(&self, key: &str) -> Result<()> {
        let payload = Envelope::new(self.id.as_str(), key).encode()?;
        self.transport.publish(&self.channel, &payload).await
    }

    // == Stats ==
    /// Returns current statistics for the local store.
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    // == Entry Count ==
    /// Returns the approximate number of locally cached entries.
    pub fn entry_count(&self) -> u64 {
        self.store.entry_count()
    }

    // == Node Id ==
    /// Returns this instance's identity token.
    pub fn node_id(&self) -> &str {
        self.id.as_str()
    }

    // == Shutdown ==
    /// Stops the invalidation subscriber and releases the subscription.
    ///
    /// Waits up to a bounded timeout for the subscriber to exit, then
    /// aborts it. Safe to call more than once and safe to race with an
    /// in-flight `invalidate`; after the first call returns, inbound
    /// broadcast traffic no longer changes this instance's store.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handle = self.subscriber.lock().take();
        if let Some(mut handle) = handle {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut handle).await.is_err() {
                warn!("Invalidation subscriber for node {} did not stop in time, aborting", self.id);
                handle.abort();
            }
        }
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        // The subscriber task must not outlive the instance even when the
        // caller skips the graceful path.
        self.shutdown.cancel();
    }
}
