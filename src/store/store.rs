//! Store Module
//!
//! Cost-bounded, TTL-aware local store shared between the calling threads
//! and the invalidation subscriber task. Backed by moka, which keeps the
//! cost bound with an approximate-frequency eviction policy and performs its
//! maintenance asynchronously, so `set` and `delete` return immediately and
//! eviction never blocks readers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::notification::RemovalCause;
use moka::sync::Cache as BoundedCache;
use moka::Expiry;

use crate::store::{CacheEntry, CacheStats, StoreStats};

// == Per-Entry Expiry ==
/// Derives each entry's expiration from the deadline stamped at insertion.
struct EntryExpiry;

impl<V> Expiry<String, CacheEntry<V>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry<V>,
        created_at: Instant,
    ) -> Option<Duration> {
        entry
            .expires_at
            .map(|deadline| deadline.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry<V>,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Overwriting a key resets its deadline to the new entry's TTL.
        entry
            .expires_at
            .map(|deadline| deadline.saturating_duration_since(updated_at))
    }
}

// == Local Store ==
/// In-process key/value store with per-entry TTL and cost-bounded admission.
///
/// Cloning is cheap and every clone observes the same entries; the store is
/// internally synchronized and supports concurrent get/set/delete from
/// multiple callers without external locking.
///
/// Admission is advisory: an entry may be dropped under cost pressure at any
/// time, even before its TTL elapses, so callers must not assume a
/// just-written key is retrievable.
pub struct LocalStore<V> {
    inner: BoundedCache<String, CacheEntry<V>>,
    stats: Arc<StoreStats>,
}

impl<V> Clone for LocalStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<V> LocalStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new LocalStore bounded to `max_cost` total admitted cost.
    ///
    /// # Arguments
    /// * `max_cost` - Maximum total cost the store may hold
    /// * `counters_hint` - Optional pre-sizing hint for the store's
    ///   bookkeeping; the store sizes itself when omitted
    pub fn new(max_cost: u64, counters_hint: Option<usize>) -> Self {
        let stats = Arc::new(StoreStats::new());
        let listener_stats = Arc::clone(&stats);

        let mut builder = BoundedCache::<String, CacheEntry<V>>::builder()
            .max_capacity(max_cost)
            .weigher(|_key: &String, entry: &CacheEntry<V>| entry.cost.max(1))
            .expire_after(EntryExpiry)
            .eviction_listener(move |_key, _entry, cause| {
                if cause == RemovalCause::Size {
                    listener_stats.record_eviction();
                }
            });

        if let Some(hint) = counters_hint {
            builder = builder.initial_capacity(hint);
        }

        Self {
            inner: builder.build(),
            stats,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Purely in-memory; never blocks on I/O and never errors. Returns None
    /// on miss or expiry.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.inner.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                Some(entry.value)
            }
            Some(_) => {
                // Deadline passed but the entry has not been reclaimed yet.
                self.inner.invalidate(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair with the given cost and TTL.
    ///
    /// Admission is silent: the store may refuse or later drop the entry
    /// under cost pressure without reporting it.
    pub fn set(&self, key: String, value: V, cost: u32, ttl: Duration) {
        self.inner.insert(key, CacheEntry::new(value, cost, ttl));
    }

    // == Delete ==
    /// Removes an entry by key. Idempotent; deleting an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        self.inner.invalidate(key);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.inner.entry_count())
    }

    // == Entry Count ==
    /// Returns the approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    // == Weighted Size ==
    /// Returns the total admitted cost currently held.
    pub fn weighted_size(&self) -> u64 {
        self.inner.weighted_size()
    }

    // == Run Pending Tasks ==
    /// Forces the store's asynchronous maintenance (eviction, expiry
    /// reclamation, bookkeeping) to run to completion.
    ///
    /// Tests use this to make eviction observable deterministically instead
    /// of sleeping through the settling window.
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const TEST_MAX_COST: u64 = 1000;
    const TEST_TTL: Duration = Duration::from_secs(300);

    fn test_store() -> LocalStore<String> {
        LocalStore::new(TEST_MAX_COST, None)
    }

    #[test]
    fn test_store_set_and_get() {
        let store = test_store();

        store.set("key1".to_string(), "value1".to_string(), 1, TEST_TTL);

        assert_eq!(store.get("key1"), Some("value1".to_string()));
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = test_store();

        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_delete() {
        let store = test_store();

        store.set("key1".to_string(), "value1".to_string(), 1, TEST_TTL);
        store.delete("key1");

        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_delete_nonexistent_is_noop() {
        let store = test_store();

        store.delete("nonexistent");
        store.delete("nonexistent");

        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_overwrite() {
        let store = test_store();

        store.set("key1".to_string(), "value1".to_string(), 1, TEST_TTL);
        store.set("key1".to_string(), "value2".to_string(), 1, TEST_TTL);

        assert_eq!(store.get("key1"), Some("value2".to_string()));
    }

    #[test]
    fn test_store_ttl_expiration() {
        let store = test_store();

        store.set(
            "key1".to_string(),
            "value1".to_string(),
            1,
            Duration::from_millis(50),
        );

        assert_eq!(store.get("key1"), Some("value1".to_string()));

        sleep(Duration::from_millis(60));

        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_cost_bound_holds_after_maintenance() {
        let store: LocalStore<String> = LocalStore::new(10, None);

        for i in 0..100 {
            store.set(format!("key{}", i), "v".to_string(), 1, TEST_TTL);
        }
        store.run_pending_tasks();

        assert!(store.weighted_size() <= 10);
    }

    #[test]
    fn test_store_heavy_entry_counts_its_cost() {
        let store: LocalStore<String> = LocalStore::new(100, None);

        store.set("heavy".to_string(), "v".to_string(), 40, TEST_TTL);
        store.run_pending_tasks();

        assert_eq!(store.weighted_size(), 40);
    }

    #[test]
    fn test_store_stats() {
        let store = test_store();

        store.set("key1".to_string(), "value1".to_string(), 1, TEST_TTL);
        store.get("key1"); // hit
        store.get("nonexistent"); // miss
        store.run_pending_tasks();

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_clones_share_entries() {
        let store = test_store();
        let view = store.clone();

        store.set("key1".to_string(), "value1".to_string(), 1, TEST_TTL);

        assert_eq!(view.get("key1"), Some("value1".to_string()));

        view.delete("key1");

        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_concurrent_callers() {
        let store = test_store();
        let mut handles = Vec::new();

        for worker in 0..4 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("w{}:k{}", worker, i);
                    store.set(key.clone(), "v".to_string(), 1, TEST_TTL);
                    store.get(&key);
                    store.delete(&key);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
