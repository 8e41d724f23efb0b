//! Fixed-window counters on top of a [`TtlStore`].
//!
//! The read-increment-write sequence is not atomic across concurrent callers,
//! so simultaneous checks for one key may overshoot the limit slightly.

use std::sync::Arc;
use std::time::Duration;

use herald_storage::{StorageError, StorageResult, TtlStore};

/// Outcome of [`RateLimiter::check_and_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Hits counted in the current window, including this one when allowed.
    pub count: u64,
    pub allowed: bool,
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn TtlStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self { store }
    }

    /// Counts a hit against `key` unless `limit` hits were already counted.
    ///
    /// Every counted hit restarts the window. A zero window disables
    /// limiting and always returns `(0, true)`.
    pub async fn check_and_count(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
    ) -> StorageResult<RateLimitDecision> {
        if window.is_zero() {
            return Ok(RateLimitDecision {
                count: 0,
                allowed: true,
            });
        }

        let count = match self.store.get(key).await? {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| StorageError::corrupt(key, e.to_string()))?,
            None => 0,
        };
        if count >= limit {
            return Ok(RateLimitDecision {
                count,
                allowed: false,
            });
        }

        let count = count + 1;
        self.store.set(key, &count.to_string(), window).await?;
        Ok(RateLimitDecision {
            count,
            allowed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_storage::InMemoryStore;

    fn limiter() -> (RateLimiter, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (RateLimiter::new(store.clone()), store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_then_reset_after_window() {
        let (limiter, _) = limiter();
        let window = Duration::from_secs(60);

        for expected in 1..=3 {
            let decision = limiter.check_and_count("k", 3, window).await.unwrap();
            assert_eq!(decision, RateLimitDecision { count: expected, allowed: true });
        }

        let rejected = limiter.check_and_count("k", 3, window).await.unwrap();
        assert_eq!(rejected, RateLimitDecision { count: 3, allowed: false });

        tokio::time::advance(window + Duration::from_secs(1)).await;
        let reset = limiter.check_and_count("k", 3, window).await.unwrap();
        assert_eq!(reset, RateLimitDecision { count: 1, allowed: true });
    }

    #[tokio::test]
    async fn test_zero_window_disables_limiting() {
        let (limiter, store) = limiter();
        for _ in 0..5 {
            let decision = limiter.check_and_count("k", 1, Duration::ZERO).await.unwrap();
            assert_eq!(decision, RateLimitDecision { count: 0, allowed: true });
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_huge_window_counts_without_panicking() {
        let (limiter, _) = limiter();
        let first = limiter.check_and_count("k", 1, Duration::MAX).await.unwrap();
        assert_eq!(first, RateLimitDecision { count: 1, allowed: true });
        let second = limiter.check_and_count("k", 1, Duration::MAX).await.unwrap();
        assert!(!second.allowed);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (limiter, _) = limiter();
        let window = Duration::from_secs(10);
        assert!(limiter.check_and_count("a", 1, window).await.unwrap().allowed);
        assert!(!limiter.check_and_count("a", 1, window).await.unwrap().allowed);
        assert!(limiter.check_and_count("b", 1, window).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_corrupt_counter() {
        let (limiter, store) = limiter();
        store.set("k", "many", Duration::from_secs(10)).await.unwrap();
        let err = limiter
            .check_and_count("k", 1, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
