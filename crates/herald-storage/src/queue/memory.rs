use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{DEFAULT_QUEUE_TTL, Queue};
use crate::error::StorageResult;
use crate::expiry::{deadline, is_live};

struct Group {
    items: VecDeque<String>,
    expires_at: Option<Instant>,
}

/// In-process [`Queue`].
///
/// Expired groups are dropped when next touched, or by
/// [`InMemoryQueue::spawn_sweeper`] for groups nobody touches again.
pub struct InMemoryQueue {
    groups: Mutex<HashMap<String, Group>>,
    ttl: Duration,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_QUEUE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Drops expired groups.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut groups = self.groups.lock();
        let before = groups.len();
        groups.retain(|_, group| is_live(group.expires_at, now));
        before - groups.len()
    }

    /// Number of groups currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.groups.lock().len()
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
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = queue.sweep();
                        if removed > 0 {
                            trace!(removed, "Swept expired queue groups");
                        }
                    }
                }
            }
        })
    }

    fn take_live(groups: &mut HashMap<String, Group>, name: &str) -> Option<Group> {
        let group = groups.remove(name)?;
        is_live(group.expires_at, Instant::now()).then_some(group)
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn push(&self, group: &str, item: &str) -> StorageResult<()> {
        let now = Instant::now();
        let mut groups = self.groups.lock();
        let entry = groups.entry(group.to_string()).or_insert_with(|| Group {
            items: VecDeque::new(),
            expires_at: Some(now),
        });
        if !is_live(entry.expires_at, now) {
            entry.items.clear();
        }
        entry.items.push_back(item.to_string());
        entry.expires_at = deadline(now, self.ttl);
        Ok(())
    }

    async fn pop(&self, group: &str) -> StorageResult<Option<String>> {
        let mut groups = self.groups.lock();
        let Some(mut live) = Self::take_live(&mut groups, group) else {
            return Ok(None);
        };
        let item = live.items.pop_front();
        if !live.items.is_empty() {
            groups.insert(group.to_string(), live);
        }
        Ok(item)
    }

    async fn pop_all(&self, group: &str) -> StorageResult<Vec<String>> {
        let mut groups = self.groups.lock();
        Ok(Self::take_live(&mut groups, group)
            .map(|live| live.items.into())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_and_drain() {
        let queue = InMemoryQueue::new();
        for item in ["a", "b", "c"] {
            queue.push("g", item).await.unwrap();
        }
        queue.push("other", "x").await.unwrap();

        assert_eq!(queue.pop("g").await.unwrap().as_deref(), Some("a"));
        assert_eq!(queue.pop_all("g").await.unwrap(), vec!["b", "c"]);
        assert!(queue.pop_all("g").await.unwrap().is_empty());
        assert_eq!(queue.pop("g").await.unwrap(), None);

        assert_eq!(queue.pop_all("other").await.unwrap(), vec!["x"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_group_expires_after_last_push() {
        let queue = InMemoryQueue::with_ttl(Duration::from_secs(10));
        queue.push("g", "old").await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        queue.push("g", "fresh").await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(queue.pop_all("g").await.unwrap(), vec!["old", "fresh"]);

        queue.push("g", "stale").await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(queue.pop_all("g").await.unwrap().is_empty());
        assert_eq!(queue.sweep(), 0);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let queue = InMemoryQueue::with_ttl(Duration::MAX);
        queue.push("g", "a").await.unwrap();
        assert_eq!(queue.sweep(), 0);
        assert_eq!(queue.pop_all("g").await.unwrap(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reclaims_untouched_groups() {
        let queue = Arc::new(InMemoryQueue::with_ttl(Duration::from_secs(10)));
        queue.push("abandoned", "1").await.unwrap();

        let shutdown = CancellationToken::new();
        let sweeper = queue.spawn_sweeper(Duration::from_secs(5), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(queue.is_empty());

        shutdown.cancel();
        sweeper.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_semantics() {
        let ttl = Duration::from_secs(1);
        let queue = InMemoryQueue::with_ttl(ttl);
        crate::conformance::assert_queue_semantics(&queue, "memory", ttl).await;
    }
}
