//! Handler trait and its blanket implementations.
//!
//! Any async function whose arguments implement [`FromContext`] and whose
//! return value implements [`HandlerResponse`] is a handler:
//!
//! ```rust,ignore
//! async fn ping() -> &'static str {
//!     "pong"
//! }
//!
//! async fn confirm(ctx: Arc<Context>, CallbackData(payload): CallbackData<Confirm>) {
//!     // ...
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::warn;

use super::response::HandlerResponse;
use crate::context::Context;
use crate::extractor::FromContext;

/// An update handler. Implemented for async functions of up to eight
/// extractor arguments.
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    async fn call(self, ctx: Arc<Context>);
}

/// A type-erased handler as stored by the router.
pub type BoxedHandler = Arc<dyn Fn(Arc<Context>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Erases a handler's type.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

/// A handler that does nothing.
pub(crate) fn noop_handler() -> BoxedHandler {
    into_handler(|| async {})
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandlerResponse + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<Context>) {
                $(
                    let $ty = match $ty::from_context(&ctx) {
                        Ok(value) => value,
                        Err(e) => {
                            warn!(
                                update_id = ctx.update().update_id,
                                extractor = std::any::type_name::<$ty>(),
                                error = %e,
                                "Extractor failed, handler skipped"
                            );
                            return;
                        }
                    };
                )*

                let res = (self)($($ty,)*).await;
                res.into_response(ctx).await;
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{CallbackData, CommandArgs};
    use crate::testing::{message_update, test_bot};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx_for(text: &str) -> (Arc<Context>, Arc<crate::testing::MockClient>) {
        let (bot, client) = test_bot();
        (
            Arc::new(Context::new(Arc::new(message_update(10, 20, text)), bot)),
            client,
        )
    }

    #[tokio::test]
    async fn test_string_response_is_sent_to_chat() {
        let (ctx, client) = ctx_for("/ping");
        let handler = into_handler(|| async { "pong" });
        handler(ctx).await;

        let sent = client.calls_to("sendMessage");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["chat_id"], 10);
        assert_eq!(sent[0]["text"], "pong");
    }

    #[tokio::test]
    async fn test_extractor_failure_skips_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (ctx, client) = ctx_for("/ping");

        let c = counter.clone();
        let handler = into_handler(move |_: CallbackData<i64>| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                "unreachable"
            }
        });
        handler(ctx).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_multiple_extractors() {
        let (ctx, client) = ctx_for("/echo hello there");
        let handler = into_handler(|ctx: Arc<Context>, CommandArgs(args): CommandArgs| async move {
            ctx.new_reply(format!("echo: {args}"))
        });
        handler(ctx).await;

        let sent = client.calls_to("sendMessage");
        assert_eq!(sent[0]["text"], "echo: hello there");
        assert_eq!(sent[0]["reply_to_message_id"], 1);
    }
}
