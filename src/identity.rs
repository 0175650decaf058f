//! Node Identity Module
//!
//! Each cache instance generates a random identity at construction. The
//! identity travels in every invalidation envelope the instance publishes,
//! and the subscriber loop uses it to recognize and discard the instance's
//! own broadcast echoes.

use rand::RngCore;

/// Number of random bytes backing an identity token.
///
/// Eight bytes keep the collision probability negligible for any realistic
/// number of live instances.
pub const ID_BYTES: usize = 8;

// == Node Identity ==
/// A process-unique identity token, hex-encoded.
///
/// Generated once per cache instance and never reused across restarts in
/// any way that matters; there is no durability requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeId(String);

impl NodeId {
    // == Generate ==
    /// Generates a fresh identity from cryptographically-random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    // == As Str ==
    /// Returns the hex-encoded token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
