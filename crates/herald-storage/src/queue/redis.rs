use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{DEFAULT_QUEUE_TTL, Queue};
use crate::MAX_REDIS_TTL;
use crate::error::StorageResult;

/// [`Queue`] backed by Redis lists.
///
/// A push is `RPUSH` + `EXPIRE` in one pipeline; a drain is `LRANGE` + `DEL`
/// inside `MULTI` so concurrent drains never see the same item twice.
#[derive(Clone)]
pub struct RedisQueue {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            ttl: DEFAULT_QUEUE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn connect(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self::new(ConnectionManager::new(client).await?))
    }
}

#[async_trait]
impl Queue for RedisQueue {
    async fn push(&self, group: &str, item: &str) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let seconds = self.ttl.min(MAX_REDIS_TTL).as_secs().max(1) as i64;
        let _: () = redis::pipe()
            .rpush(group, item)
            .ignore()
            .expire(group, seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn pop(&self, group: &str) -> StorageResult<Option<String>> {
        let mut conn = self.conn.clone();
        let item: Option<String> = conn.lpop(group, None).await?;
        Ok(item)
    }

    async fn pop_all(&self, group: &str) -> StorageResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let (items,): (Vec<String>,) = redis::pipe()
            .atomic()
            .lrange(group, 0, -1)
            .del(group)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(items)
    }
}
