//! Time-bounded memoization for dashboard aggregates.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// A small TTL cache keyed by query shape.
///
/// Entries expire `ttl` after insertion; expired entries are dropped on the
/// next access. The cache is held in the server state and passed where
/// needed rather than living in process-global storage.
#[derive(Debug, Clone)]
pub(crate) struct TtlCache<K, V> {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<K, (Instant, V)>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached value for `key` if it has not expired.
    pub(crate) async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key`, restarting its expiry clock.
    pub(crate) async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        entries.insert(key, (Instant::now(), value));
    }
}
