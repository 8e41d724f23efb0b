//! Per-group append / drain queue.

mod memory;
#[cfg(feature = "redis")]
mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageResult;

pub use memory::InMemoryQueue;
#[cfg(feature = "redis")]
pub use self::redis::RedisQueue;

/// How long a group survives after its most recent push.
pub const DEFAULT_QUEUE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Ordered lists of opaque strings, one per group.
///
/// Items come back in push order. Every push refreshes the group's expiry.
#[async_trait]
pub trait Queue: Send + Sync {
    async fn push(&self, group: &str, item: &str) -> StorageResult<()>;

    /// Removes and returns the oldest item of the group.
    async fn pop(&self, group: &str) -> StorageResult<Option<String>>;

    /// Removes and returns every item of the group in one step.
    async fn pop_all(&self, group: &str) -> StorageResult<Vec<String>>;
}
