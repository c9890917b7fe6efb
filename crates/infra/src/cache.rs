//! Read-through TTL cache with an explicit lifecycle. Instances are built
//! at the composition root and injected; the sweeper is a task the owner
//! starts and stops, not a process-wide singleton. Nothing may rely on this
//! cache for correctness — entries expire, and callers always re-fetch on a
//! miss.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use danke_domain::util::now_ms;

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at_ms: i64,
}

#[derive(Clone)]
pub struct TtlCache<K, V> {
    entries: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    ttl_ms: i64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl_ms,
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at_ms > now_ms())
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            expires_at_ms: now_ms() + self.ttl_ms,
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    /// Drops expired entries; returns how many were removed. Expiry is also
    /// enforced on read, so the sweep only bounds memory.
    pub async fn sweep(&self) -> usize {
        let now = now_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at_ms > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn start_sweeper(&self, interval: Duration) -> SweeperHandle {
        let cache = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "cache sweep");
                }
            }
        });
        SweeperHandle { task }
    }
}

pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_entries_miss_on_read() {
        let cache: TtlCache<String, i32> = TtlCache::new(5);
        cache.insert("a".to_string(), 1).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let short: TtlCache<String, i32> = TtlCache::new(5);
        short.insert("old".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let long: TtlCache<String, i32> = TtlCache::new(60_000);
        long.insert("fresh".to_string(), 2).await;

        assert_eq!(short.sweep().await, 1);
        assert!(short.is_empty().await);
        assert_eq!(long.sweep().await, 0);
        assert_eq!(long.len().await, 1);
    }

    #[tokio::test]
    async fn invalidate_drops_the_entry() {
        let cache: TtlCache<String, i32> = TtlCache::new(60_000);
        cache.insert("a".to_string(), 1).await;
        cache.invalidate(&"a".to_string()).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }

    #[tokio::test]
    async fn sweeper_runs_until_stopped() {
        let cache: TtlCache<String, i32> = TtlCache::new(5);
        cache.insert("a".to_string(), 1).await;
        let handle = cache.start_sweeper(Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.is_empty().await);
        handle.stop();
    }
}
