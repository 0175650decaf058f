//! Broadcast Transport Module
//!
//! The external-collaborator boundary of the cache layer: a minimal
//! publish/subscribe contract over one shared topic. A published message
//! reaches every current subscriber of the topic; there is no persistence
//! for subscribers that were not listening at publish time, per-sender FIFO
//! is the only ordering guarantee, and delivery is at-most-once.

mod local;
mod redis;

pub use self::local::LocalBroadcast;
pub use self::redis::RedisBroadcast;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;

// == Public Constants ==
/// Buffer depth for inbound subscription delivery
pub const SUBSCRIPTION_BUFFER: usize = 64;

// == Broadcast Trait ==
/// A publish/subscribe transport delivering messages to all current
/// subscribers of a topic.
#[async_trait]
pub trait Broadcast: Send + Sync {
    /// Publishes a payload to every current subscriber of `topic`.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Opens a subscription that delivers every payload published to
    /// `topic` from this point on, until the subscription is dropped or the
    /// transport closes it.
    async fn subscribe(&self, topic: &str) -> Result<Subscription>;
}

// == Subscription ==
/// An inbound message sequence for one topic.
///
/// Payloads arrive through an internal channel fed by a forwarder task that
/// owns the underlying transport resource. Dropping the subscription aborts
/// the forwarder and releases that resource.
pub struct Subscription {
    rx: mpsc::Receiver<Vec<u8>>,
    forwarder: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<Vec<u8>>, forwarder: JoinHandle<()>) -> Self {
        Self { rx, forwarder }
    }

    /// Receives the next inbound payload.
    ///
    /// Returns None only when the transport has closed the stream; an open
    /// subscription is a never-ending sequence.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}
