//! Behaviour every backend must share, run by each backend's tests.
//!
//! Expiry is checked with `tokio::time::sleep`, so the in-process backends
//! run these under paused time and Redis runs them against the real clock.

use std::time::Duration;

use crate::queue::Queue;
use crate::store::TtlStore;

/// Keys are placed under `herald-test/{namespace}/` so runs against a shared
/// server stay apart.
pub(crate) async fn assert_store_semantics(store: &dyn TtlStore, namespace: &str) {
    let key = |name: &str| format!("herald-test/{namespace}/store/{name}");

    assert_eq!(store.get(&key("never_written")).await.unwrap(), None);

    store.set(&key("value"), "v1", Duration::from_secs(60)).await.unwrap();
    assert_eq!(store.get(&key("value")).await.unwrap().as_deref(), Some("v1"));

    // A rewrite replaces both the value and the expiry.
    store.set(&key("rewrite"), "old", Duration::from_millis(200)).await.unwrap();
    store.set(&key("rewrite"), "new", Duration::from_secs(60)).await.unwrap();

    store.set(&key("short"), "v", Duration::from_millis(200)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(store.get(&key("short")).await.unwrap(), None);
    assert_eq!(store.get(&key("rewrite")).await.unwrap().as_deref(), Some("new"));
    assert_eq!(store.get(&key("value")).await.unwrap().as_deref(), Some("v1"));
}

/// `queue` must have been built with a time-to-live of `ttl`.
pub(crate) async fn assert_queue_semantics(queue: &dyn Queue, namespace: &str, ttl: Duration) {
    let group = |name: &str| format!("herald-test/{namespace}/queue/{name}");
    for name in ["fifo", "other", "expiring"] {
        queue.pop_all(&group(name)).await.unwrap();
    }

    assert_eq!(queue.pop(&group("fifo")).await.unwrap(), None);
    assert!(queue.pop_all(&group("fifo")).await.unwrap().is_empty());

    for item in ["a", "b", "c"] {
        queue.push(&group("fifo"), item).await.unwrap();
    }
    queue.push(&group("other"), "x").await.unwrap();

    assert_eq!(queue.pop(&group("fifo")).await.unwrap().as_deref(), Some("a"));
    assert_eq!(queue.pop_all(&group("fifo")).await.unwrap(), vec!["b", "c"]);
    assert!(queue.pop_all(&group("fifo")).await.unwrap().is_empty());
    assert_eq!(queue.pop_all(&group("other")).await.unwrap(), vec!["x"]);

    queue.push(&group("expiring"), "stale").await.unwrap();
    tokio::time::sleep(ttl + Duration::from_millis(1500)).await;
    assert!(queue.pop_all(&group("expiring")).await.unwrap().is_empty());
}
