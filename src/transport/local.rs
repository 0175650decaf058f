//! In-Process Broadcast Transport
//!
//! A topic map of broadcast channels inside one process. Cache instances
//! sharing a clone of the same `LocalBroadcast` see each other's
//! invalidations exactly as they would over a networked transport, which
//! makes it the fabric of choice for tests and single-host deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::Result;
use crate::transport::{Broadcast, Subscription, SUBSCRIPTION_BUFFER};

// == Local Broadcast ==
/// In-process publish/subscribe fabric.
///
/// Cloning is cheap; all clones share the same topics.
#[derive(Clone, Default)]
pub struct LocalBroadcast {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>,
}

impl LocalBroadcast {
    // == Constructor ==
    /// Creates a new fabric with no topics.
    pub fn new() -> Self {
        Self::default()
    }

    fn topic_sender(&self, topic: &str) -> broadcast::Sender<Vec<u8>> {
        let mut topics = self.topics.lock();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(SUBSCRIPTION_BUFFER).0)
            .clone()
    }
}

#[async_trait]
impl Broadcast for LocalBroadcast {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        // A publish with no live subscribers is not an error; the channel
        // has no persistence guarantee for absent listeners.
        let _ = self.topic_sender(topic).send(payload.to_vec());
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        let mut source = self.topic_sender(topic).subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let forwarder = tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("In-process subscription lagged, skipped {} messages", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(rx, forwarder))
    }
}
