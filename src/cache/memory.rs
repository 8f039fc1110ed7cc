// src/cache/memory.rs

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::CacheStore;

/// Upper bound on cached lists; per-thread post lists are the only keys that grow.
const MAX_ENTRIES: u64 = 10_000;

/// In-process store backed by `moka`. Expired and least-used entries are evicted.
pub struct MemoryCache {
    entries: moka::future::Cache<String, Value>,
}

impl MemoryCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        let mut builder = moka::future::Cache::builder().max_capacity(MAX_ENTRIES);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            entries: builder.build(),
        }
    }

    /// Number of live entries after pending evictions have run.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).await
    }

    async fn set(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value).await;
    }

    async fn invalidate(&self, key: &str) {
        self.entries.invalidate(key).await;
    }
}
