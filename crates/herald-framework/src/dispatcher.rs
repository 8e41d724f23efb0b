//! Update dispatcher.
//!
//! Each update is classified, routed to the handlers registered for its
//! type, and every handler runs on its own fault-isolated task:
//!
//! 1. Middlewares run in registration order and cannot stop the update
//! 2. One fresh [`Context`] is built for the update
//! 3. The update type picks the sub-router; commands and callback routes
//!    resolve to at most one handler, broadcast types run every handler
//!
//! Nothing is retried. Unroutable updates are logged and dropped.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures::future::BoxFuture;
use herald_core::i18n::keys;
use herald_core::{EditMessageText, FALLBACK_LOCALE, MemberStatus, Update, UpdateType};
use tokio::task::JoinHandle;
use tower::Service;
use tracing::{Instrument, Level, debug, error, info, span, warn};

use crate::bot::BotApi;
use crate::callback::CallbackToken;
use crate::context::Context;
use crate::handler::BoxedHandler;
use crate::router::{CommandTarget, Router};
use crate::task::{TaskOutcome, spawn_isolated};

/// How a callback query token was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResolution {
    /// Route and payload found; the handler was spawned.
    Dispatched,
    /// The data was not two non-empty `;`-separated hashes.
    MalformedToken,
    /// No route is registered under the route hash.
    MissingRoute,
    /// The route is known but has no handler.
    MissingHandler,
    /// The payload expired or was never stored.
    MissingPayload,
    /// The store failed while fetching the payload.
    StoreError,
}

impl CallbackResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::MalformedToken => "malformed_token",
            Self::MissingRoute => "missing_route",
            Self::MissingHandler => "missing_handler",
            Self::MissingPayload => "missing_payload",
            Self::StoreError => "store_error",
        }
    }
}

impl fmt::Display for CallbackResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single dispatch did.
#[derive(Debug)]
pub struct Dispatched {
    pub update_type: UpdateType,
    /// Set for callback queries.
    pub callback: Option<CallbackResolution>,
    tasks: Vec<JoinHandle<TaskOutcome>>,
}

impl Dispatched {
    /// Number of handler tasks spawned.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every spawned handler task.
    pub async fn join(self) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            outcomes.push(task.await.unwrap_or(TaskOutcome::Cancelled));
        }
        outcomes
    }
}

/// Routes updates to the handlers of a [`Router`].
///
/// Cloning is cheap; clones share the router and the bot handles.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    bot: BotApi,
}

impl Dispatcher {
    pub fn new(router: Router, bot: BotApi) -> Self {
        Self {
            router: Arc::new(router),
            bot,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn bot(&self) -> &BotApi {
        &self.bot
    }

    /// Dispatches one update. Returns once every handler task is spawned;
    /// use [`Dispatched::join`] to wait for them.
    pub async fn dispatch(&self, update: Update) -> Dispatched {
        let update = Arc::new(update);
        let update_type = update.update_type();
        let span = span!(
            Level::DEBUG,
            "dispatch",
            update_id = update.update_id,
            update_type = %update_type
        );

        self.dispatch_classified(update, update_type)
            .instrument(span)
            .await
    }

    async fn dispatch_classified(&self, update: Arc<Update>, update_type: UpdateType) -> Dispatched {
        for middleware in &self.router.middlewares {
            middleware(&Context::new(Arc::clone(&update), self.bot.clone()));
        }

        let ctx = Arc::new(Context::new(update, self.bot.clone()));
        let mut dispatched = Dispatched {
            update_type,
            callback: None,
            tasks: Vec::new(),
        };

        match update_type {
            UpdateType::Message => self.dispatch_message(ctx, &mut dispatched.tasks),
            UpdateType::ChannelPost => {
                self.broadcast("channel_post", &self.router.channel_post, ctx, &mut dispatched.tasks)
            }
            UpdateType::MyChatMember => {
                self.log_channel_membership(&ctx).await;
                self.broadcast("my_chat_member", &self.router.my_chat_member, ctx, &mut dispatched.tasks)
            }
            UpdateType::LeftChatMember => self.broadcast(
                "left_chat_member",
                &self.router.left_chat_member,
                ctx,
                &mut dispatched.tasks,
            ),
            UpdateType::NewChatMembers => self.broadcast(
                "new_chat_members",
                &self.router.new_chat_members,
                ctx,
                &mut dispatched.tasks,
            ),
            UpdateType::ChatMigrationFrom => {
                if let Some(message) = ctx.update().message.as_ref() {
                    info!(
                        chat_id = message.chat.id,
                        from_chat_id = message.migrate_from_chat_id.unwrap_or_default(),
                        "Chat migrated from another chat"
                    );
                }
                self.broadcast(
                    "chat_migration_from",
                    &self.router.chat_migration_from,
                    ctx,
                    &mut dispatched.tasks,
                )
            }
            UpdateType::ChatMigrationTo => {
                if let Some(message) = ctx.update().message.as_ref() {
                    info!(
                        chat_id = message.chat.id,
                        to_chat_id = message.migrate_to_chat_id.unwrap_or_default(),
                        "Chat migrated to another chat"
                    );
                }
            }
            UpdateType::CallbackQuery => {
                let resolution = self
                    .dispatch_callback_query(ctx, &mut dispatched.tasks)
                    .await;
                dispatched.callback = Some(resolution);
            }
            UpdateType::Unknown => debug!("Unknown update shape, dropped"),
            other => debug!(update_type = %other, "Update type not yet supported"),
        }

        dispatched
    }

    fn dispatch_message(&self, ctx: Arc<Context>, tasks: &mut Vec<JoinHandle<TaskOutcome>>) {
        let Some(message) = ctx.update().message.as_ref() else {
            return;
        };

        let sender = message
            .from
            .as_ref()
            .map(|user| user.identity())
            .unwrap_or_default();
        debug!(
            chat_id = message.chat.id,
            chat = %message.chat.display_title(),
            sender = %sender,
            text = message.text.as_deref().unwrap_or("<empty or contains media>"),
            "Received message"
        );

        let Some(command) = message.command().map(str::to_string) else {
            return;
        };
        let label = format!("/{command}");
        match self.router.commands.get(&command) {
            Some(CommandTarget::Handler(handler)) => {
                tasks.push(spawn_isolated(label, handler(ctx)));
            }
            Some(CommandTarget::Builtin(builtin)) => {
                let builtin = *builtin;
                let router = Arc::clone(&self.router);
                tasks.push(spawn_isolated(label, async move {
                    builtin.run(&router, ctx).await
                }));
            }
            None => debug!(command = %command, "No handler for command, ignored"),
        }
    }

    fn broadcast(
        &self,
        kind: &str,
        handlers: &[BoxedHandler],
        ctx: Arc<Context>,
        tasks: &mut Vec<JoinHandle<TaskOutcome>>,
    ) {
        for (index, handler) in handlers.iter().enumerate() {
            tasks.push(spawn_isolated(
                format!("{kind}#{index}"),
                handler(Arc::clone(&ctx)),
            ));
        }
    }

    /// Logs the bot joining or leaving a channel.
    async fn log_channel_membership(&self, ctx: &Context) {
        let Some(change) = ctx.update().my_chat_member.as_ref() else {
            return;
        };
        if !change.chat.is_channel() {
            return;
        }

        if change.new_chat_member.status == MemberStatus::Administrator {
            match self.bot.get_chat(change.chat.id).await {
                Ok(chat) => info!(
                    chat_id = chat.id,
                    title = %chat.display_title(),
                    "Joined channel"
                ),
                Err(e) => warn!(chat_id = change.chat.id, error = %e, "Joined channel, but failed to fetch it"),
            }
        } else {
            info!(
                chat_id = change.chat.id,
                title = %change.chat.display_title(),
                status = change.new_chat_member.status.as_str(),
                "Left channel"
            );
        }
    }

    // =========================================================================
    // Callback queries
    // =========================================================================

    async fn dispatch_callback_query(
        &self,
        ctx: Arc<Context>,
        tasks: &mut Vec<JoinHandle<TaskOutcome>>,
    ) -> CallbackResolution {
        let data = ctx
            .update()
            .callback_query
            .as_ref()
            .and_then(|query| query.data.clone())
            .unwrap_or_default();

        let Some(token) = CallbackToken::parse(&data) else {
            error!(data = %data, resolution = %CallbackResolution::MalformedToken, "Malformed callback query data");
            self.notify_invalid_action(&ctx).await;
            return CallbackResolution::MalformedToken;
        };

        let route = self.router.callback_routes.get(&token.route_hash).cloned();
        let resolution = self.resolve_token(&ctx, &token, route.as_deref(), tasks).await;

        info!(
            route = route.as_deref().unwrap_or_default(),
            route_hash = %token.route_hash,
            action_hash = %token.action_hash,
            resolution = %resolution,
            "Callback query resolved"
        );
        resolution
    }

    async fn resolve_token(
        &self,
        ctx: &Arc<Context>,
        token: &CallbackToken,
        route: Option<&str>,
        tasks: &mut Vec<JoinHandle<TaskOutcome>>,
    ) -> CallbackResolution {
        let Some(route) = route else {
            error!(
                route_hash = %token.route_hash,
                solution = %self.bot.t(FALLBACK_LOCALE, keys::MISSING_ROUTE_SOLUTION, &[]),
                "{}",
                self.bot.t(FALLBACK_LOCALE, keys::MISSING_ROUTE_ERROR, &[])
            );
            return CallbackResolution::MissingRoute;
        };

        let Some(handler) = self.router.callback_handlers.get(&token.route_hash) else {
            error!(route, route_hash = %token.route_hash, "Callback route has no handler");
            self.notify_invalid_action(ctx).await;
            return CallbackResolution::MissingHandler;
        };

        let payload = match self
            .bot
            .fetch_callback_payload(route, &token.action_hash)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                error!(route, action_hash = %token.action_hash, error = %e, "Failed to fetch callback payload");
                return CallbackResolution::StoreError;
            }
        };

        let Some(payload) = payload else {
            error!(
                route,
                action_hash = %token.action_hash,
                solution = %self.bot.t(FALLBACK_LOCALE, keys::MISSING_ACTION_DATA_SOLUTION, &[]),
                "{}",
                self.bot.t(FALLBACK_LOCALE, keys::MISSING_ACTION_DATA_ERROR, &[])
            );
            self.notify_invalid_action(ctx).await;
            return CallbackResolution::MissingPayload;
        };

        ctx.bind_payload(payload);
        tasks.push(spawn_isolated(
            format!("callback:{route}"),
            handler(Arc::clone(ctx)),
        ));
        CallbackResolution::Dispatched
    }

    /// Tells the user the button is no longer valid, in the default locale.
    /// Edits the button's message when there is one.
    async fn notify_invalid_action(&self, ctx: &Context) {
        let Some(query) = ctx.update().callback_query.as_ref() else {
            return;
        };
        let text = self.bot.t(
            &self.bot.settings().default_locale,
            keys::INVALID_ACTION_DATA_TRY_AGAIN,
            &[],
        );

        let result = match query.message.as_ref() {
            Some(message) => self
                .bot
                .edit_text(EditMessageText::new(message.chat.id, message.message_id, text))
                .await
                .map(drop),
            None => self
                .bot
                .answer_callback_query(&query.id, Some(text))
                .await
                .map(drop),
        };
        if let Err(e) = result {
            error!(error = %e, "Failed to send invalid action notice");
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.router.command_names())
            .field("callback_routes", &self.router.callback_route_names())
            .finish()
    }
}

impl Service<Update> for Dispatcher {
    type Response = Dispatched;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Dispatched, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, update: Update) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.dispatch(update).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::DispatchSettings;
    use crate::callback::route_hash;
    use crate::command::Command;
    use crate::error::HandlerError;
    use crate::extractor::CallbackData;
    use crate::testing::{MockClient, callback_update, message_update, test_bot};
    use herald_core::{Chat, ChatMember, ChatMemberUpdated, ChatType, Message, User};
    use herald_storage::Storage;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    const INVALID_NOTICE: &str = "Sorry, this operation cannot be performed as it is invalid. \
        Please initiate another session of operation and try again.";

    #[derive(Debug, PartialEq, Deserialize)]
    struct Confirm {
        id: i64,
    }

    fn counting(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, ()> + Clone + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move || {
            let counter = Arc::clone(&counter);
            let fut: BoxFuture<'static, ()> = Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            fut
        }
    }

    async fn explode() {
        panic!("handler exploded")
    }

    fn dispatcher(router: Router) -> (Dispatcher, Arc<MockClient>) {
        let (bot, client) = test_bot();
        (Dispatcher::new(router, bot), client)
    }

    fn channel_update(chat: Chat) -> Update {
        Update {
            update_id: 3,
            channel_post: Some(Message {
                message_id: 5,
                chat,
                text: Some("news".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn channel() -> Chat {
        Chat {
            id: -100,
            kind: ChatType::Channel,
            title: Some("Announcements".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ping_replies_pong_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        let c = Arc::clone(&calls);
        router.on_command(Command::new("ping", move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                "pong"
            }
        }));
        let (dispatcher, client) = dispatcher(router);

        let dispatched = dispatcher.dispatch(message_update(10, 20, "/ping")).await;
        assert_eq!(dispatched.update_type, UpdateType::Message);
        assert_eq!(dispatched.join().await, vec![TaskOutcome::Completed]);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let sent = client.calls_to("sendMessage");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["chat_id"], 10);
        assert_eq!(sent[0]["text"], "pong");
    }

    #[tokio::test]
    async fn test_unmatched_command_ignored() {
        let (dispatcher, client) = dispatcher(Router::new());
        let dispatched = dispatcher.dispatch(message_update(10, 20, "/nope")).await;
        assert_eq!(dispatched.task_count(), 0);

        let dispatched = dispatcher.dispatch(message_update(10, 20, "just text")).await;
        assert_eq!(dispatched.task_count(), 0);
        assert!(client.calls().is_empty());
    }

    async fn assert_callback_round_trip(bot: BotApi, client: Arc<MockClient>) {
        let received = Arc::new(Mutex::new(None));
        let mut router = Router::new();
        let r = Arc::clone(&received);
        router.on_callback_query("confirm", move |CallbackData(payload): CallbackData<Confirm>| {
            let r = Arc::clone(&r);
            async move {
                *r.lock() = Some(payload);
            }
        });
        let dispatcher = Dispatcher::new(router, bot);

        let token = dispatcher
            .bot()
            .assign_callback_data("confirm", &json!({"id": 42}))
            .await
            .unwrap();
        assert_eq!(token.len(), 33);

        let dispatched = dispatcher.dispatch(callback_update(&token)).await;
        assert_eq!(dispatched.callback, Some(CallbackResolution::Dispatched));
        assert_eq!(dispatched.join().await, vec![TaskOutcome::Completed]);
        assert_eq!(*received.lock(), Some(Confirm { id: 42 }));

        // Pressing the same button again resolves again.
        let dispatched = dispatcher.dispatch(callback_update(&token)).await;
        assert_eq!(dispatched.callback, Some(CallbackResolution::Dispatched));
        dispatched.join().await;
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_callback_round_trip() {
        let (bot, client) = test_bot();
        assert_callback_round_trip(bot, client).await;
    }

    #[tokio::test]
    async fn test_callback_round_trip_over_redis() {
        let Ok(url) = std::env::var("HERALD_TEST_REDIS_URL") else {
            return;
        };
        let storage = Storage::redis(&url).await.unwrap();
        let client = Arc::new(MockClient::new());
        assert_callback_round_trip(BotApi::new(client.clone(), storage), client).await;
    }

    #[tokio::test]
    async fn test_unregistered_route_is_silent() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        router.on_callback_query("confirm", counting(&invoked));
        let (dispatcher, client) = dispatcher(router);

        let dispatched = dispatcher
            .dispatch(callback_update("00000000;00000000"))
            .await;
        assert_eq!(dispatched.callback, Some(CallbackResolution::MissingRoute));
        assert_eq!(dispatched.task_count(), 0);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        assert!(client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_payload_notifies_once() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        router.on_callback_query("confirm", counting(&invoked));
        let (bot, client) = test_bot();
        let bot = bot.with_settings(DispatchSettings {
            callback_data_ttl: Duration::from_secs(30),
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(router, bot);

        let token = dispatcher
            .bot()
            .assign_callback_data("confirm", &json!({"id": 42}))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let dispatched = dispatcher.dispatch(callback_update(&token)).await;
        assert_eq!(dispatched.callback, Some(CallbackResolution::MissingPayload));
        assert_eq!(dispatched.task_count(), 0);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);

        assert_eq!(client.calls().len(), 1);
        let edits = client.calls_to("editMessageText");
        assert_eq!(edits[0]["chat_id"], 10);
        assert_eq!(edits[0]["message_id"], 77);
        assert_eq!(edits[0]["text"], INVALID_NOTICE);
    }

    #[tokio::test]
    async fn test_malformed_token_answers_query_without_message() {
        let (dispatcher, client) = dispatcher(Router::new());

        for data in ["garbage", ";abc", "abc;", "a;b;c", ""] {
            let mut update = callback_update(data);
            if let Some(query) = update.callback_query.as_mut() {
                query.message = None;
            }
            let dispatched = dispatcher.dispatch(update).await;
            assert_eq!(dispatched.callback, Some(CallbackResolution::MalformedToken));
        }

        let answers = client.calls_to("answerCallbackQuery");
        assert_eq!(answers.len(), 5);
        assert_eq!(answers[0]["callback_query_id"], "cbq-1");
        assert_eq!(answers[0]["text"], INVALID_NOTICE);
    }

    #[tokio::test]
    async fn test_route_without_handler_notifies() {
        let mut router = Router::new();
        router.on_callback_query("confirm", || async {});
        router.callback_handlers.remove(&route_hash("confirm"));
        let (dispatcher, client) = dispatcher(router);

        let token = dispatcher
            .bot()
            .assign_callback_data("confirm", &json!({"id": 1}))
            .await
            .unwrap();
        let dispatched = dispatcher.dispatch(callback_update(&token)).await;
        assert_eq!(dispatched.callback, Some(CallbackResolution::MissingHandler));
        assert_eq!(client.calls_to("editMessageText").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_invalid_notice_is_swallowed() {
        let (dispatcher, client) = dispatcher(Router::new());
        client.fail("editMessageText");

        let dispatched = dispatcher.dispatch(callback_update("garbage")).await;
        assert_eq!(dispatched.callback, Some(CallbackResolution::MalformedToken));
        assert_eq!(dispatched.task_count(), 0);
        assert_eq!(client.calls_to("editMessageText").len(), 1);
        assert!(client.calls_to("answerCallbackQuery").is_empty());
    }

    #[tokio::test]
    async fn test_nop_route_is_inert() {
        let (dispatcher, client) = dispatcher(Router::new());
        let token = dispatcher.bot().assign_nop_callback_data().await.unwrap();

        let dispatched = dispatcher.dispatch(callback_update(&token)).await;
        assert_eq!(dispatched.callback, Some(CallbackResolution::Dispatched));
        assert_eq!(dispatched.join().await, vec![TaskOutcome::Completed]);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_faulted_handler_does_not_affect_next_update() {
        let mut router = Router::new();
        router.on_command(Command::new("boom", explode));
        router.on_command(Command::new("ping", || async { "pong" }));
        let (dispatcher, client) = dispatcher(router);

        let outcomes = dispatcher
            .dispatch(message_update(10, 20, "/boom"))
            .await
            .join()
            .await;
        assert_eq!(outcomes, vec![TaskOutcome::Faulted("handler exploded".into())]);

        let outcomes = dispatcher
            .dispatch(message_update(10, 20, "/ping"))
            .await
            .join()
            .await;
        assert_eq!(outcomes, vec![TaskOutcome::Completed]);
        assert_eq!(client.calls_to("sendMessage")[0]["text"], "pong");
    }

    #[tokio::test]
    async fn test_broadcast_runs_every_handler() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        router
            .on_channel_post(counting(&invoked))
            .on_channel_post(explode)
            .on_channel_post(counting(&invoked));
        let (dispatcher, _) = dispatcher(router);

        let outcomes = dispatcher
            .dispatch(channel_update(channel()))
            .await
            .join()
            .await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.is_faulted()).count(), 1);
        assert_eq!(invoked.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_membership_message_shapes() {
        let left = Arc::new(AtomicUsize::new(0));
        let joined = Arc::new(AtomicUsize::new(0));
        let migrated = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        router
            .on_left_chat_member(counting(&left))
            .on_new_chat_member(counting(&joined))
            .on_chat_migration_from(counting(&migrated));
        let (dispatcher, _) = dispatcher(router);

        let mut update = message_update(-5, 20, "");
        if let Some(message) = update.message.as_mut() {
            message.text = None;
            message.new_chat_members = Some(vec![User {
                id: 30,
                ..Default::default()
            }]);
        }
        dispatcher.dispatch(update.clone()).await.join().await;

        if let Some(message) = update.message.as_mut() {
            message.new_chat_members = None;
            message.left_chat_member = Some(User {
                id: 30,
                ..Default::default()
            });
        }
        dispatcher.dispatch(update.clone()).await.join().await;

        if let Some(message) = update.message.as_mut() {
            message.left_chat_member = None;
            message.migrate_from_chat_id = Some(-4);
        }
        dispatcher.dispatch(update.clone()).await.join().await;

        if let Some(message) = update.message.as_mut() {
            message.migrate_from_chat_id = None;
            message.migrate_to_chat_id = Some(-1006);
        }
        let dispatched = dispatcher.dispatch(update).await;
        assert_eq!(dispatched.update_type, UpdateType::ChatMigrationTo);
        assert_eq!(dispatched.task_count(), 0);

        assert_eq!(joined.load(Ordering::SeqCst), 1);
        assert_eq!(left.load(Ordering::SeqCst), 1);
        assert_eq!(migrated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_my_chat_member_in_channel_fetches_chat() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        router.on_my_chat_member(counting(&invoked));
        let (dispatcher, client) = dispatcher(router);

        let bot_user = User {
            id: MockClient::BOT_ID,
            is_bot: true,
            ..Default::default()
        };
        let mut change = ChatMemberUpdated {
            chat: channel(),
            from: User {
                id: 20,
                ..Default::default()
            },
            date: 0,
            old_chat_member: ChatMember {
                user: bot_user.clone(),
                status: MemberStatus::Left,
            },
            new_chat_member: ChatMember {
                user: bot_user,
                status: MemberStatus::Administrator,
            },
        };
        let update = Update {
            my_chat_member: Some(change.clone()),
            ..Default::default()
        };
        dispatcher.dispatch(update).await.join().await;
        assert_eq!(client.calls_to("getChat")[0]["chat_id"], -100);

        change.new_chat_member.status = MemberStatus::Left;
        let update = Update {
            my_chat_member: Some(change),
            ..Default::default()
        };
        dispatcher.dispatch(update).await.join().await;

        assert_eq!(client.calls_to("getChat").len(), 1);
        assert_eq!(invoked.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsupported_types_are_dropped() {
        let (dispatcher, client) = dispatcher(Router::new());
        let mut update = message_update(10, 20, "/help");
        update.edited_message = update.message.take();

        let dispatched = dispatcher.dispatch(update).await;
        assert_eq!(dispatched.update_type, UpdateType::EditedMessage);
        assert_eq!(dispatched.task_count(), 0);

        let dispatched = dispatcher.dispatch(Update::default()).await;
        assert_eq!(dispatched.update_type, UpdateType::Unknown);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_middlewares_see_every_update() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        let s = Arc::clone(&seen);
        router.use_middleware(move |ctx: &Context| {
            s.lock().push(ctx.update().update_type());
        });
        let (dispatcher, _) = dispatcher(router);

        dispatcher.dispatch(message_update(10, 20, "hi")).await;
        dispatcher.dispatch(Update::default()).await;
        assert_eq!(*seen.lock(), vec![UpdateType::Message, UpdateType::Unknown]);
    }

    #[tokio::test]
    async fn test_start_falls_back_to_help() {
        let (dispatcher, client) = dispatcher(Router::new());
        dispatcher
            .dispatch(message_update(10, 20, "/start"))
            .await
            .join()
            .await;

        let sent = client.calls_to("sendMessage");
        assert_eq!(sent.len(), 1);
        let text = sent[0]["text"].as_str().unwrap();
        assert!(text.starts_with("Here are the available commands:"));
        assert!(text.contains("/start - Begin interacting with the bot"));
    }

    #[tokio::test]
    async fn test_start_runs_handlers_in_order() {
        let mut router = Router::new();
        router
            .on_start_command(|| async { "welcome" })
            .on_start_command(|| async { "second" });
        let (dispatcher, client) = dispatcher(router);
        dispatcher
            .dispatch(message_update(10, 20, "/start"))
            .await
            .join()
            .await;

        let texts: Vec<_> = client
            .calls_to("sendMessage")
            .iter()
            .map(|params| params["text"].clone())
            .collect();
        assert_eq!(texts, vec![json!("welcome"), json!("second")]);
    }

    #[tokio::test]
    async fn test_cancel_runs_matching_handlers() {
        let mut router = Router::new();
        router
            .on_cancel_command(|_| async { Ok::<_, HandlerError>(true) }, || async { "draft discarded" })
            .on_cancel_command(|_| async { Ok::<_, HandlerError>(false) }, || async { "never" })
            .on_cancel_command(
                |_| async { Err::<bool, _>(HandlerError::exception(std::io::Error::other("store down"))) },
                || async { "never either" },
            );
        let (dispatcher, client) = dispatcher(router);
        dispatcher
            .dispatch(message_update(10, 20, "/cancel"))
            .await
            .join()
            .await;

        let sent = client.calls_to("sendMessage");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["text"], "draft discarded");
    }

    #[tokio::test]
    async fn test_cancel_with_nothing_to_cancel() {
        let mut router = Router::new();
        router.on_cancel_command(|_| async { Ok::<_, HandlerError>(false) }, || async { "never" });
        let (dispatcher, client) = dispatcher(router);
        dispatcher
            .dispatch(message_update(10, 20, "/cancel"))
            .await
            .join()
            .await;

        let sent = client.calls_to("sendMessage");
        assert_eq!(sent[0]["text"], "No ongoing operations to cancel");
    }

    #[tokio::test]
    async fn test_tower_service() {
        let mut router = Router::new();
        router.on_command(Command::new("ping", || async { "pong" }));
        let (dispatcher, client) = dispatcher(router);

        let dispatched = dispatcher
            .oneshot(message_update(10, 20, "/ping"))
            .await
            .unwrap();
        dispatched.join().await;
        assert_eq!(client.calls_to("sendMessage").len(), 1);
    }
}
