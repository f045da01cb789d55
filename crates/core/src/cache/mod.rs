//! Short-lived key/value cache.
//!
//! The only durable-ish state the pipeline relies on: resolved download
//! URLs are kept here for an hour so repeat plays skip the provider round
//! trip. Entries expire implicitly by TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// TTL for resolved download URLs.
pub const DOWNLOAD_TTL: Duration = Duration::from_secs(3_600);

/// A cached download resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedDownload {
    pub url: String,
}

/// Keyed value store with per-entry TTL.
#[async_trait]
pub trait KvCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

/// In-memory TTL cache. Expired entries are dropped on read and lazily
/// pruned on write.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires)) if *expires > Instant::now() => {
                    return Some(value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it.
        self.entries.write().await.remove(key);
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value, now + ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_gone() {
        let cache = MemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_value() {
        let cache = MemoryCache::new();
        cache
            .set("k", "old".to_string(), Duration::from_secs(60))
            .await;
        cache
            .set("k", "new".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await, Some("new".to_string()));
    }

    #[test]
    fn test_cached_download_serialization() {
        let cached = CachedDownload {
            url: "http://provider.example/dl/1".to_string(),
        };
        let json = serde_json::to_string(&cached).unwrap();
        let parsed: CachedDownload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cached);
    }
}
