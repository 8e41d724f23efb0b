//! Where updates come from.
//!
//! Transports (long polling, webhooks, a replay file) implement
//! [`UpdateSource`]. The runtime pulls from it until it returns `None` or a
//! shutdown is requested.

use async_trait::async_trait;
use herald_core::Update;
use tokio::sync::mpsc;

/// A stream of platform updates.
///
/// `next_update` must be cancel safe: the runtime races it against the
/// shutdown signal.
#[async_trait]
pub trait UpdateSource: Send {
    /// Returns the next update, or `None` once the source is exhausted.
    async fn next_update(&mut self) -> Option<Update>;
}

#[async_trait]
impl UpdateSource for mpsc::Receiver<Update> {
    async fn next_update(&mut self) -> Option<Update> {
        self.recv().await
    }
}

#[async_trait]
impl UpdateSource for mpsc::UnboundedReceiver<Update> {
    async fn next_update(&mut self) -> Option<Update> {
        self.recv().await
    }
}
