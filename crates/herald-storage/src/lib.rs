//! # Herald Storage
//!
//! The two storage capabilities the framework depends on:
//!
//! - [`TtlStore`]: string values with a time-to-live and get-or-absent reads.
//! - [`Queue`]: per-group ordered lists with an atomic drain.
//!
//! Each has an in-process implementation and, behind the `redis` feature, a
//! Redis implementation with the same observable behaviour. [`Storage`]
//! bundles one of each; the backend is chosen once, at construction.

pub mod error;
mod expiry;
pub mod keys;
pub mod queue;
pub mod store;

#[cfg(test)]
mod conformance;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use error::{StorageError, StorageResult};
pub use queue::{DEFAULT_QUEUE_TTL, InMemoryQueue, Queue};
#[cfg(feature = "redis")]
pub use queue::RedisQueue;
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use store::{InMemoryStore, TtlStore};

/// Longest expiry sent to Redis. Larger values overflow the server's
/// millisecond clock and are rejected, so they are capped here.
#[cfg(feature = "redis")]
pub(crate) const MAX_REDIS_TTL: Duration = Duration::from_secs(u32::MAX as u64);

/// A store and a queue from the same backend.
#[derive(Clone)]
pub struct Storage {
    pub store: Arc<dyn TtlStore>,
    pub queue: Arc<dyn Queue>,
}

impl Storage {
    pub fn new(store: Arc<dyn TtlStore>, queue: Arc<dyn Queue>) -> Self {
        Self { store, queue }
    }

    /// In-process backends. The concrete handles are returned too so the
    /// caller can run their expiry sweepers.
    pub fn in_memory() -> (Self, InMemoryBackends) {
        let backends = InMemoryBackends {
            store: Arc::new(InMemoryStore::new()),
            queue: Arc::new(InMemoryQueue::new()),
        };
        let storage = Self::new(backends.store.clone(), backends.queue.clone());
        (storage, backends)
    }

    /// Redis backends sharing one multiplexed connection.
    #[cfg(feature = "redis")]
    pub async fn redis(url: &str) -> StorageResult<Self> {
        let client = ::redis::Client::open(url)?;
        let conn = ::redis::aio::ConnectionManager::new(client).await?;
        Ok(Self::new(
            Arc::new(RedisStore::new(conn.clone())),
            Arc::new(RedisQueue::new(conn)),
        ))
    }
}

/// Concrete handles behind [`Storage::in_memory`].
#[derive(Clone)]
pub struct InMemoryBackends {
    pub store: Arc<InMemoryStore>,
    pub queue: Arc<InMemoryQueue>,
}

impl InMemoryBackends {
    /// Starts one sweeper per backend. Both stop when `shutdown` is cancelled.
    pub fn spawn_sweepers(
        &self,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        vec![
            self.store.spawn_sweeper(interval, shutdown.clone()),
            self.queue.spawn_sweeper(interval, shutdown),
        ]
    }
}
