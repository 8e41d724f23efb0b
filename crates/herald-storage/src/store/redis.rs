use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::TtlStore;
use crate::MAX_REDIS_TTL;
use crate::error::StorageResult;

/// [`TtlStore`] backed by Redis; expiry is enforced server-side with `PX`.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connects to the server at `url` (`redis://` or `rediss://`).
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self::new(ConnectionManager::new(client).await?))
    }
}

#[async_trait]
impl TtlStore for RedisStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        // PX rejects 0, so sub-millisecond TTLs round up
        let millis = ttl.min(MAX_REDIS_TTL).as_millis().max(1) as i64;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connect() -> Option<RedisStore> {
        let url = std::env::var("HERALD_TEST_REDIS_URL").ok()?;
        Some(RedisStore::connect(&url).await.unwrap())
    }

    #[tokio::test]
    async fn test_shared_semantics() {
        let Some(store) = connect().await else {
            return;
        };
        crate::conformance::assert_store_semantics(&store, "redis").await;
    }

    #[tokio::test]
    async fn test_huge_ttl_is_capped() {
        let Some(store) = connect().await else {
            return;
        };
        let key = "herald-test/redis/store/huge_ttl";
        store.set(key, "kept", Duration::MAX).await.unwrap();
        assert_eq!(store.get(key).await.unwrap().as_deref(), Some("kept"));
    }
}
