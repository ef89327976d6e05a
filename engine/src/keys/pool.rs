//! Key pool for a single provider
//!
//! Round-robin rotation over an ordered set of keys, plus a set of keys that
//! are temporarily considered failed. Rotation (`next`) and the exhaustive
//! retry listing (`available`) are two independent query paths: `next` walks
//! every key regardless of failures, `available` skips failed keys.
//!
//! All state lives behind one mutex per pool.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sdk::errors::EngineError;
use tracing::debug;

use super::{ApiKey, Provider};

struct PoolState {
    /// Index of the key handed out by the next `next()` call
    cursor: usize,

    /// Positions of keys marked failed
    failed: HashSet<usize>,
}

pub struct KeyPool {
    provider: Provider,
    keys: Vec<ApiKey>,
    state: Mutex<PoolState>,
}

impl KeyPool {
    /// Create a pool; fails with `EmptyPool` when `keys` is empty
    pub fn new(provider: Provider, keys: Vec<ApiKey>) -> Result<Self, EngineError> {
        if keys.is_empty() {
            return Err(EngineError::EmptyPool {
                provider: provider.to_string(),
            });
        }

        Ok(Self {
            provider,
            keys,
            state: Mutex::new(PoolState {
                cursor: 0,
                failed: HashSet::new(),
            }),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Total number of keys, failed or not
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Return the key at the cursor and advance the cursor
    pub fn next(&self) -> ApiKey {
        let mut state = self.lock();
        let key = self.keys[state.cursor].clone();
        state.cursor = (state.cursor + 1) % self.keys.len();
        key
    }

    /// Mark a key as failed. Returns false if it was already failed or is not
    /// part of this pool.
    pub fn mark_failed(&self, key: &ApiKey) -> bool {
        let mut state = self.lock();
        let mut newly_failed = false;
        for (index, candidate) in self.keys.iter().enumerate() {
            if candidate == key && state.failed.insert(index) {
                newly_failed = true;
                debug!("{} key #{} marked failed", self.provider, index + 1);
            }
        }
        newly_failed
    }

    /// Keys not currently marked failed, in insertion order
    pub fn available(&self) -> Vec<ApiKey> {
        let state = self.lock();
        self.keys
            .iter()
            .enumerate()
            .filter(|(index, _)| !state.failed.contains(index))
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn available_count(&self) -> usize {
        let state = self.lock();
        self.keys.len() - state.failed.len()
    }

    /// Forget all failures
    pub fn reset_failed(&self) {
        let mut state = self.lock();
        if !state.failed.is_empty() {
            debug!(
                "{} pool: clearing {} failed key(s)",
                self.provider,
                state.failed.len()
            );
        }
        state.failed.clear();
    }

    // A panic while holding the lock cannot leave PoolState half-updated,
    // so a poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for KeyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPool")
            .field("provider", &self.provider)
            .field("keys", &self.len())
            .field("available", &self.available_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pool(keys: &[&str]) -> KeyPool {
        KeyPool::new(
            Provider::OpenAI,
            keys.iter().map(|k| ApiKey::new(*k)).collect(),
        )
        .unwrap()
    }

    fn raw(keys: &[ApiKey]) -> Vec<String> {
        keys.iter().map(|k| k.expose().to_string()).collect()
    }

    #[test]
    fn test_empty_pool_rejected() {
        let err = KeyPool::new(Provider::Gemini, vec![]).unwrap_err();
        assert!(matches!(err, EngineError::EmptyPool { ref provider } if provider == "gemini"));
    }

    #[test]
    fn test_rotation_fairness() {
        let pool = pool(&["k1", "k2", "k3"]);
        let first_cycle: Vec<String> = (0..3).map(|_| pool.next().expose().to_string()).collect();
        let second_cycle: Vec<String> =
            (0..3).map(|_| pool.next().expose().to_string()).collect();

        assert_eq!(first_cycle, vec!["k1", "k2", "k3"]);
        assert_eq!(second_cycle, first_cycle);
    }

    #[test]
    fn test_failed_key_excluded_from_available() {
        let pool = pool(&["k1", "k2", "k3"]);
        assert!(pool.mark_failed(&ApiKey::new("k2")));

        assert_eq!(raw(&pool.available()), vec!["k1", "k3"]);
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_next_still_offers_failed_key() {
        let pool = pool(&["k1", "k2"]);
        pool.mark_failed(&ApiKey::new("k2"));

        let offered: Vec<String> = (0..4).map(|_| pool.next().expose().to_string()).collect();
        assert_eq!(offered, vec!["k1", "k2", "k1", "k2"]);
    }

    #[test]
    fn test_mark_failed_is_idempotent() {
        let pool = pool(&["k1", "k2"]);
        assert!(pool.mark_failed(&ApiKey::new("k1")));
        assert!(!pool.mark_failed(&ApiKey::new("k1")));
        assert!(!pool.mark_failed(&ApiKey::new("unknown")));
        assert_eq!(pool.available_count(), 1);
    }

    #[test]
    fn test_reset_failed() {
        let pool = pool(&["k1", "k2"]);
        pool.mark_failed(&ApiKey::new("k1"));
        pool.mark_failed(&ApiKey::new("k2"));
        assert!(pool.available().is_empty());

        pool.reset_failed();
        assert_eq!(raw(&pool.available()), vec!["k1", "k2"]);
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let pool = pool(&["super-secret"]);
        let rendered = format!("{:?}", pool);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("keys: 1"));
    }

    #[test]
    fn test_concurrent_rotation_hands_out_each_key_evenly() {
        let pool = Arc::new(pool(&["a", "b", "c", "d"]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| pool.next().expose().to_string())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut counts = std::collections::HashMap::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                *counts.entry(key).or_insert(0) += 1;
            }
        }

        // 800 calls over 4 keys: the shared cursor gives exactly 200 each
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&n| n == 200));
    }
}
