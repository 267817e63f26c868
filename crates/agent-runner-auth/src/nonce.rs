//! Replay protection for accepted nonces.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

/// How long an accepted nonce is remembered: twice the signature freshness
/// window, covering clock skew in both directions.
const REPLAY_TTL: Duration = Duration::from_secs(240);

/// Tracks accepted nonces for a bounded window to block replays.
///
/// Shared across sessions; the check-and-set is atomic under an internal
/// lock, so concurrent calls with the same nonce admit exactly one caller.
pub struct NonceStore {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceStore {
    /// Create a store with the protocol replay window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(REPLAY_TTL)
    }

    /// Create a store with a custom TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record a nonce unless it was already accepted within the TTL.
    ///
    /// Returns `true` on first acceptance, `false` on a replay. A replay
    /// never extends or resets the existing record. Expired entries are
    /// purged on each call, so the store stays bounded by the traffic of
    /// one replay window.
    pub fn try_accept(&self, nonce: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().unwrap();

        seen.retain(|_, accepted_at| now.duration_since(*accepted_at) < self.ttl);

        if seen.contains_key(nonce) {
            return false;
        }
        seen.insert(nonce.to_string(), now);
        true
    }

    /// Number of nonces currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Whether no nonces are currently remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
