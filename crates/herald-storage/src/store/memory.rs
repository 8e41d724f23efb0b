use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::TtlStore;
use crate::error::StorageResult;
use crate::expiry::{deadline, is_live};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-process [`TtlStore`].
///
/// Expiry is checked lazily on read. [`InMemoryStore::spawn_sweeper`] also
/// reclaims memory held by keys nobody reads again.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| is_live(entry.expires_at, now));
        before - entries.len()
    }

    /// Number of entries currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweeps on a fixed interval until `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        if removed > 0 {
                            trace!(removed, "Swept expired store entries");
                        }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl TtlStore for InMemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key)
            && is_live(entry.expires_at, Instant::now())
        {
            return Ok(Some(entry.value.clone()));
        }
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> StorageResult<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: deadline(Instant::now(), ttl),
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }
}
