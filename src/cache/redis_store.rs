// src/cache/redis_store.rs

//! Shared store for deployments running several app instances.
//!
//! Entries are JSON strings under `lms:{key}`. Redis errors are logged and
//! degrade to cache misses; the database stays the source of truth.

use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use serde_json::Value;

use super::CacheStore;

const KEY_PREFIX: &str = "lms:";

pub struct RedisCache {
    connection: ConnectionManager,
    ttl: Option<Duration>,
}

/// Opens a managed connection that reconnects on failure.
pub async fn connect(redis_url: &str) -> redis::RedisResult<ConnectionManager> {
    let config = ConnectionManagerConfig::new().set_number_of_retries(1);

    let client = Client::open(redis_url)?;
    client.get_connection_manager_with_config(config).await
}

fn prefixed(key: &str) -> String {
    format!("{}{}", KEY_PREFIX, key)
}

impl RedisCache {
    pub fn new(connection: ConnectionManager, ttl: Option<Duration>) -> Self {
        Self { connection, ttl }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = match conn.get(prefixed(key)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("redis get {} failed: {}", key, e);
                return None;
            }
        };
        raw.and_then(|raw| serde_json::from_str(&raw).ok())
    }

    async fn set(&self, key: &str, value: Value) {
        let mut conn = self.connection.clone();
        let raw = value.to_string();
        let result: redis::RedisResult<()> = match self.ttl {
            Some(ttl) => conn.set_ex(prefixed(key), raw, ttl.as_secs().max(1)).await,
            None => conn.set(prefixed(key), raw).await,
        };
        if let Err(e) = result {
            tracing::warn!("redis set {} failed: {}", key, e);
        }
    }

    async fn invalidate(&self, key: &str) {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = conn.del(prefixed(key)).await;
        if let Err(e) = result {
            tracing::error!("redis invalidate {} failed: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(prefixed("post_list:3"), "lms:post_list:3");
    }

    #[tokio::test]
    #[ignore = "requires REDIS_URL"]
    async fn round_trip_and_invalidate() {
        let url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
        let store = RedisCache::new(connect(&url).await.unwrap(), Some(Duration::from_secs(30)));

        store.set("thread_list", serde_json::json!(["a"])).await;
        assert_eq!(store.get("thread_list").await, Some(serde_json::json!(["a"])));

        store.invalidate("thread_list").await;
        store.invalidate("thread_list").await;
        assert!(store.get("thread_list").await.is_none());
    }
}
