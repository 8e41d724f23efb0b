//! Expiring key-value store.

mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageResult;

pub use memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// A string store whose entries expire after a time-to-live.
///
/// Expired and never-written keys are both reported as `None`.
#[async_trait]
pub trait TtlStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()>;
}
