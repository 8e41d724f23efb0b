//! Fault-isolated handler tasks.

use std::any::Any;

use tokio::task::JoinHandle;
use tracing::{Instrument, Span, error, warn};

/// How an isolated task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// The task panicked; carries the panic message.
    Faulted(String),
    Cancelled,
}

impl TaskOutcome {
    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

/// Spawns `fut` so that a panic inside it is caught at the task boundary,
/// logged, and reported as [`TaskOutcome::Faulted`] instead of unwinding into
/// the caller.
pub fn spawn_isolated<F>(label: String, fut: F) -> JoinHandle<TaskOutcome>
where
    F: Future<Output = ()> + Send + 'static,
{
    let span = Span::current();
    let inner = tokio::spawn(fut.instrument(span.clone()));

    tokio::spawn(
        async move {
            match inner.await {
                Ok(()) => TaskOutcome::Completed,
                Err(e) if e.is_panic() => {
                    let message = panic_message(e.into_panic());
                    error!(task = %label, panic = %message, "Handler panicked");
                    TaskOutcome::Faulted(message)
                }
                Err(e) => {
                    warn!(task = %label, error = %e, "Handler task cancelled");
                    TaskOutcome::Cancelled
                }
            }
        }
        .instrument(span),
    )
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn boom() {
        panic!("boom")
    }

    async fn bad_id(id: i64) {
        panic!("bad id {id}")
    }

    #[tokio::test]
    async fn test_completed() {
        let outcome = spawn_isolated("ok".into(), async {}).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Completed);
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let outcome = spawn_isolated("boom".into(), boom()).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Faulted("boom".into()));

        let outcome = spawn_isolated("fmt".into(), bad_id(7)).await.unwrap();
        assert_eq!(outcome, TaskOutcome::Faulted("bad id 7".into()));
    }
}
