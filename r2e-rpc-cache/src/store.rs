use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Pluggable cache backend. `get`/`set` carry the TTL contract spec.md §4.5
/// requires: implementations include an in-memory fake (below, used in
/// tests and as the zero-config default) and a Redis-compatible adapter
/// (left as an external collaborator per spec.md §1).
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

/// Default in-memory store backed by `DashMap`, mirroring the teacher
/// crate's `InMemoryStore` but keyed on the serialized cache-entry contract
/// rather than a generic TTL cache.
#[derive(Default)]
pub struct InMemoryStore {
    inner: DashMap<String, (String, Instant, Duration)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.inner.get(key) {
            let (val, inserted, ttl) = entry.value();
            if inserted.elapsed() < *ttl {
                return Some(val.clone());
            }
            drop(entry);
            self.inner.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        self.inner.insert(key.to_string(), (value, Instant::now(), ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_none_before_any_set() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn set_then_get_within_ttl_returns_value() {
        let store = InMemoryStore::new();
        store.set("k", "v".to_string(), Duration::from_secs(60)).await;
        assert_eq!(store.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn entry_expires_after_ttl() {
        let store = InMemoryStore::new();
        store.set("k", "v".to_string(), Duration::from_millis(20)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await, None);
    }
}
