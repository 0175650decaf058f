//! Redis Broadcast Transport
//!
//! Publishes on a managed multiplexed connection and drains one dedicated
//! pub/sub connection per subscription. Redis guarantees per-publisher FIFO
//! delivery on a channel and drops messages for absent subscribers, which
//! matches the advisory nature of invalidation notices.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::mpsc;

use crate::error::{CacheError, Result};
use crate::transport::{Broadcast, Subscription, SUBSCRIPTION_BUFFER};

// == Redis Broadcast ==
/// Broadcast transport backed by Redis pub/sub.
pub struct RedisBroadcast {
    client: Client,
    publisher: ConnectionManager,
}

impl RedisBroadcast {
    // == Connect ==
    /// Connects to the Redis server at `addr` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// A connection failure here surfaces as `CacheError::Connect` and no
    /// transport is returned.
    pub async fn connect(addr: &str) -> Result<Self> {
        let client = Client::open(addr).map_err(|err| CacheError::Connect(err.to_string()))?;
        let publisher = ConnectionManager::new(client.clone())
            .await
            .map_err(|err| CacheError::Connect(err.to_string()))?;

        Ok(Self { client, publisher })
    }
}

#[async_trait]
impl Broadcast for RedisBroadcast {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let mut conn = self.publisher.clone();
        conn.publish::<_, _, ()>(topic, payload)
            .await
            .map_err(|err| CacheError::Publish(err.to_string()))?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|err| CacheError::Subscribe(err.to_string()))?;
        pubsub
            .subscribe(topic)
            .await
            .map_err(|err| CacheError::Subscribe(err.to_string()))?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        // The forwarder owns the pub/sub connection; dropping the
        // subscription aborts it, which closes the connection and with it
        // the server-side subscription.
        let forwarder = tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(message) = messages.next().await {
                if tx.send(message.get_payload_bytes().to_vec()).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(rx, forwarder))
    }
}
