// src/cache/mod.rs

//! Aggregate-list caching.
//!
//! Handlers never touch a process-wide cache implicitly: the store is a
//! `CacheStore` held in `AppState`, and every write path calls
//! [`Cache::on_write`] with what it changed. Which keys that drops is decided
//! by [`policy::keys_to_invalidate`].

pub mod memory;
pub mod policy;
pub mod redis_store;

use std::{collections::HashMap, fmt, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::Mutex;

pub use memory::MemoryCache;
pub use policy::{Entity, Mutation, keys_to_invalidate};
pub use redis_store::RedisCache;

/// Named cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    LectureList,
    CurrentQuizList,
    ThreadList,
    /// Posts of a single thread.
    PostList(i64),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::LectureList => write!(f, "lecture_list"),
            CacheKey::CurrentQuizList => write!(f, "current_quiz_list"),
            CacheKey::ThreadList => write!(f, "thread_list"),
            CacheKey::PostList(thread_id) => write!(f, "post_list:{}", thread_id),
        }
    }
}

/// Key-value store backing the cache.
///
/// Implementations must treat `invalidate` of a missing key as a no-op.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    async fn set(&self, key: &str, value: Value);

    async fn invalidate(&self, key: &str);
}

/// Cheaply cloneable handle to the shared cache store.
///
/// Each key carries a generation that every invalidation bumps. A computed
/// value is only stored when its key's generation did not move while it was
/// being computed, so a snapshot read before a write never outlives that
/// write's invalidation.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    generations: Arc<Mutex<HashMap<String, u64>>>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn in_memory(ttl: Option<Duration>) -> Self {
        Self::new(Arc::new(MemoryCache::new(ttl)))
    }

    async fn generation(&self, name: &str) -> u64 {
        self.generations.lock().await.get(name).copied().unwrap_or(0)
    }

    /// Returns the cached value for `key`, or runs `compute` and caches its result.
    ///
    /// Errors from `compute` are returned as-is and nothing is stored. An entry
    /// that no longer deserializes into `T` is treated as a miss.
    pub async fn get_or_compute<T, E, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let name = key.to_string();

        if let Some(raw) = self.store.get(&name).await {
            match serde_json::from_value::<T>(raw) {
                Ok(value) => {
                    tracing::debug!("cache hit: {}", name);
                    return Ok(value);
                }
                Err(e) => tracing::warn!("discarding unreadable cache entry {}: {}", name, e),
            }
        }

        tracing::debug!("cache miss: {}", name);
        let started_at = self.generation(&name).await;
        let value = compute().await?;

        let raw = match serde_json::to_value(&value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("not caching {}: {}", name, e);
                return Ok(value);
            }
        };

        // Held across `set` so an invalidation cannot slip in between check and store.
        let generations = self.generations.lock().await;
        if generations.get(&name).copied().unwrap_or(0) == started_at {
            self.store.set(&name, raw).await;
        } else {
            tracing::debug!("not caching {}: invalidated while computing", name);
        }

        Ok(value)
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        let name = key.to_string();
        tracing::debug!("cache invalidate: {}", name);

        let mut generations = self.generations.lock().await;
        *generations.entry(name.clone()).or_insert(0) += 1;
        self.store.invalidate(&name).await;
    }

    /// Drops every entry made stale by `mutation` on `entity`.
    pub async fn on_write(&self, entity: Entity, mutation: Mutation) {
        for key in keys_to_invalidate(entity, mutation) {
            self.invalidate(&key).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn load_titles(calls: &AtomicUsize) -> Result<Vec<String>, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["Week 1".to_string(), "Week 2".to_string()])
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache = Cache::in_memory(None);
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute(&CacheKey::LectureList, || load_titles(&calls))
            .await
            .unwrap();
        let second = cache
            .get_or_compute(&CacheKey::LectureList, || load_titles(&calls))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_recompute() {
        let cache = Cache::in_memory(None);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_compute(&CacheKey::LectureList, || load_titles(&calls))
            .await
            .unwrap();
        cache.on_write(Entity::Lecture, Mutation::Create).await;
        cache
            .get_or_compute(&CacheKey::LectureList, || load_titles(&calls))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn write_during_compute_discards_the_snapshot() {
        let cache = Cache::in_memory(None);
        let writer = cache.clone();

        // The list is read, then a thread is created before the read finishes.
        let snapshot: Vec<String> = cache
            .get_or_compute(&CacheKey::ThreadList, || async move {
                let rows = vec!["old".to_string()];
                writer.on_write(Entity::Thread, Mutation::Create).await;
                Ok::<_, String>(rows)
            })
            .await
            .unwrap();
        assert_eq!(snapshot, vec!["old".to_string()]);

        let current: Vec<String> = cache
            .get_or_compute(&CacheKey::ThreadList, || async {
                Ok::<_, String>(vec!["new".to_string()])
            })
            .await
            .unwrap();
        assert_eq!(current, vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn unrelated_write_during_compute_still_caches() {
        let cache = Cache::in_memory(None);
        let writer = cache.clone();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_compute(&CacheKey::LectureList, || async move {
                writer.on_write(Entity::Thread, Mutation::Create).await;
                Ok::<_, String>(vec!["Week 1".to_string()])
            })
            .await
            .unwrap();
        cache
            .get_or_compute(&CacheKey::LectureList, || load_titles(&calls))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn view_increment_keeps_thread_list() {
        let cache = Cache::in_memory(None);
        let calls = AtomicUsize::new(0);

        cache
            .get_or_compute(&CacheKey::ThreadList, || load_titles(&calls))
            .await
            .unwrap();
        cache.on_write(Entity::Thread, Mutation::IncrementViews).await;
        cache
            .get_or_compute(&CacheKey::ThreadList, || load_titles(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.on_write(Entity::Thread, Mutation::Update).await;
        cache
            .get_or_compute(&CacheKey::ThreadList, || load_titles(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached() {
        let cache = Cache::in_memory(None);

        let failed: Result<Vec<String>, String> = cache
            .get_or_compute(&CacheKey::ThreadList, || async { Err("db down".to_string()) })
            .await;
        assert!(failed.is_err());

        let calls = AtomicUsize::new(0);
        cache
            .get_or_compute(&CacheKey::ThreadList, || load_titles(&calls))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn keys_render_as_named_entries() {
        assert_eq!(CacheKey::LectureList.to_string(), "lecture_list");
        assert_eq!(CacheKey::CurrentQuizList.to_string(), "current_quiz_list");
        assert_eq!(CacheKey::ThreadList.to_string(), "thread_list");
        assert_eq!(CacheKey::PostList(7).to_string(), "post_list:7");
    }
}
