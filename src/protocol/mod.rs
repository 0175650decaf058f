//! Invalidation Protocol Module
//!
//! The wire envelope carried on the broadcast channel and the subscriber
//! loop that turns inbound envelopes into local-store deletions.
//!
//! The protocol is advisory, not authoritative: envelopes are consumed at
//! most once per subscriber, never redelivered, and only ever cause
//! deletions. A subscriber that misses a message simply serves a stale entry
//! until its TTL elapses or the next invalidation arrives.

mod envelope;
mod subscriber;

pub use envelope::Envelope;

pub(crate) use subscriber::spawn_subscriber;
