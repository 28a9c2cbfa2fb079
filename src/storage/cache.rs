use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// In-process cache with per-entry time-to-live, shared across service
/// handles via Arc. Values are stored as JSON so callers stay decoupled
/// from each other's types.
#[derive(Clone, Default)]
pub struct TtlCache {
    inner: Arc<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct CacheEntry {
    expires_at: Instant,
    payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a cached value. Expired or unparsable entries count as misses.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self
            .inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let hit = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                serde_json::from_str(&entry.payload).ok()
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        match hit {
            Some(value) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a value under the key. Serialization failures drop the write.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Ok(payload) = serde_json::to_string(value) {
            let mut entries = self
                .inner
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            entries.insert(
                key.to_string(),
                CacheEntry {
                    expires_at: Instant::now() + ttl,
                    payload,
                },
            );
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let cache = TtlCache::new();
        cache.set("answer", &42u32, Duration::from_secs(60));
        assert_eq!(cache.get::<u32>("answer"), Some(42));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = TtlCache::new();
        cache.set("gone", &1u32, Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get::<u32>("gone"), None);
    }

    #[test]
    fn test_stats_counts_hits_and_misses() {
        let cache = TtlCache::new();
        cache.set("key", &"value".to_string(), Duration::from_secs(60));
        let _ = cache.get::<String>("key");
        let _ = cache.get::<String>("missing");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = TtlCache::new();
        let other = cache.clone();
        cache.set("shared", &7u32, Duration::from_secs(60));
        assert_eq!(other.get::<u32>("shared"), Some(7));
    }
}
