//! Invalidation Subscriber Task
//!
//! A dedicated task, spawned at cache construction, that consumes the
//! broadcast subscription for the lifetime of the instance and deletes
//! every remotely-invalidated key from the local store.
//!
//! Two states: Running (consuming messages) and Stopped (cancellation
//! observed or subscription closed). Messages in flight at the moment of
//! cancellation may be dropped; invalidation is advisory, not authoritative.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::identity::NodeId;
use crate::protocol::Envelope;
use crate::store::LocalStore;
use crate::transport::Subscription;

/// Spawns the subscriber loop for one cache instance.
///
/// The returned handle is joined during shutdown so the task's lifetime is
/// deterministic. The subscription is owned exclusively by the task and is
/// released when the loop exits.
pub(crate) fn spawn_subscriber<V>(
    store: LocalStore<V>,
    id: NodeId,
    subscription: Subscription,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(run(store, id, subscription, shutdown))
}

/// The Running state: suspend on the next inbound message or cancellation,
/// never busy-poll.
async fn run<V>(
    store: LocalStore<V>,
    id: NodeId,
    mut subscription: Subscription,
    shutdown: CancellationToken,
) where
    V: Clone + Send + Sync + 'static,
{
    debug!("Invalidation subscriber running for node {}", id);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Invalidation subscriber stopped for node {}", id);
                break;
            }
            inbound = subscription.recv() => {
                let Some(payload) = inbound else {
                    warn!("Broadcast subscription closed, invalidation subscriber exiting");
                    break;
                };

                match Envelope::decode(&payload) {
                    Ok(envelope) => {
                        // Self-echo: never invalidate a key this node just wrote.
                        if envelope.sender_id == id.as_str() {
                            continue;
                        }
                        debug!(
                            "Invalidating key {:?} on notice from node {}",
                            envelope.key, envelope.sender_id
                        );
                        store.delete(&envelope.key);
                    }
                    Err(err) => {
                        // Broadcast messages are not redelivered; drop and move on.
                        warn!("Dropping malformed invalidation message: {}", err);
                    }
                }
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Broadcast, LocalBroadcast};
    use std::time::Duration;

    const TEST_TTL: Duration = Duration::from_secs(300);
    const SETTLE: Duration = Duration::from_millis(100);

    fn seeded_store(key: &str) -> LocalStore<String> {
        let store: LocalStore<String> = LocalStore::new(1000, None);
        store.set(key.to_string(), "value".to_string(), 1, TEST_TTL);
        store
    }

    #[tokio::test]
    async fn test_remote_notice_deletes_key() {
        let fabric = LocalBroadcast::new();
        let store = seeded_store("user:1");
        let id = NodeId::generate();
        let shutdown = CancellationToken::new();

        let subscription = fabric.subscribe("sync").await.unwrap();
        let handle = spawn_subscriber(store.clone(), id, subscription, shutdown.clone());

        let notice = Envelope::new("ffffffffffffffff", "user:1").encode().unwrap();
        fabric.publish("sync", &notice).await.unwrap();
        tokio::time::sleep(SETTLE).await;

        assert_eq!(store.get("user:1"), None);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_own_notice_is_ignored() {
        let fabric = LocalBroadcast::new();
        let store = seeded_store("user:1");
        let id = NodeId::generate();
        let shutdown = CancellationToken::new();

        let subscription = fabric.subscribe("sync").await.unwrap();
        let handle = spawn_subscriber(store.clone(), id.clone(), subscription, shutdown.clone());

        let echo = Envelope::new(id.as_str(), "user:1").encode().unwrap();
        fabric.publish("sync", &echo).await.unwrap();
        tokio::time::sleep(SETTLE).await;

        assert_eq!(store.get("user:1"), Some("value".to_string()));

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_message_does_not_kill_loop() {
        let fabric = LocalBroadcast::new();
        let store = seeded_store("user:1");
        let id = NodeId::generate();
        let shutdown = CancellationToken::new();

        let subscription = fabric.subscribe("sync").await.unwrap();
        let handle = spawn_subscriber(store.clone(), id, subscription, shutdown.clone());

        fabric.publish("sync", b"not an envelope").await.unwrap();

        // The loop must survive and still apply the next valid notice.
        let notice = Envelope::new("ffffffffffffffff", "user:1").encode().unwrap();
        fabric.publish("sync", &notice).await.unwrap();
        tokio::time::sleep(SETTLE).await;

        assert_eq!(store.get("user:1"), None);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancellation_stops_processing() {
        let fabric = LocalBroadcast::new();
        let store = seeded_store("user:1");
        let id = NodeId::generate();
        let shutdown = CancellationToken::new();

        let subscription = fabric.subscribe("sync").await.unwrap();
        let handle = spawn_subscriber(store.clone(), id, subscription, shutdown.clone());

        shutdown.cancel();
        handle.await.unwrap();

        // Notices published after the loop exits must not touch the store.
        let notice = Envelope::new("ffffffffffffffff", "user:1").encode().unwrap();
        fabric.publish("sync", &notice).await.unwrap();
        tokio::time::sleep(SETTLE).await;

        assert_eq!(store.get("user:1"), Some("value".to_string()));
    }
}
