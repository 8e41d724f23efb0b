//! Platform, storage and localisation handles shared by every dispatch.

use std::sync::Arc;
use std::time::Duration;

use herald_core::{
    AnswerCallbackQuery, ApiResult, Chat, ChatClient, ChatClientExt, DeleteMessage,
    EditMessageText, FALLBACK_LOCALE, GetChat, GetChatMember, MemberStatus, Message, SendMessage,
    StaticTranslator, Translator,
};
use herald_storage::{Queue, Storage, StorageResult, TtlStore, keys};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::callback::{CallbackToken, NOP_ROUTE};
use crate::error::CallbackDataError;
use crate::rate_limit::{RateLimitDecision, RateLimiter};

/// Default lifetime of stored callback payloads.
pub const DEFAULT_CALLBACK_DATA_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Tunables applied to every dispatch.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// How long a callback payload stays resolvable.
    pub callback_data_ttl: Duration,
    /// Locale for users without one and for "invalid, try again" notices.
    pub default_locale: String,
    /// Platform name used inside rate-limit keys.
    pub platform: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            callback_data_ttl: DEFAULT_CALLBACK_DATA_TTL,
            default_locale: FALLBACK_LOCALE.to_string(),
            platform: "telegram".to_string(),
        }
    }
}

/// Cheaply cloneable bundle of everything a handler talks to.
#[derive(Clone)]
pub struct BotApi {
    client: Arc<dyn ChatClient>,
    store: Arc<dyn TtlStore>,
    queue: Arc<dyn Queue>,
    translator: Arc<dyn Translator>,
    settings: Arc<DispatchSettings>,
}

impl BotApi {
    pub fn new(client: Arc<dyn ChatClient>, storage: Storage) -> Self {
        Self {
            client,
            store: storage.store,
            queue: storage.queue,
            translator: Arc::new(StaticTranslator::new()),
            settings: Arc::new(DispatchSettings::default()),
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn TtlStore> {
        &self.store
    }

    pub fn queue(&self) -> &Arc<dyn Queue> {
        &self.queue
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn t(&self, locale: &str, key: &str, args: &[(&str, &str)]) -> String {
        self.translator.translate(locale, key, args)
    }

    // =========================================================================
    // Messaging
    // =========================================================================

    pub async fn send(&self, request: SendMessage) -> ApiResult<Message> {
        self.client.request(&request).await
    }

    /// Sends and logs instead of failing. Users who blocked the bot or never
    /// started it are expected and only logged at debug.
    pub async fn may_send(&self, request: SendMessage) -> Option<Message> {
        let chat_id = request.chat_id;
        match self.client.request(&request).await {
            Ok(message) => Some(message),
            Err(e) if e.is_bot_blocked_by_user() || e.is_cannot_initiate_chat() => {
                debug!(chat_id, error = %e, "Message not deliverable");
                None
            }
            Err(e) => {
                error!(chat_id, error = %e, "Failed to send message");
                None
            }
        }
    }

    pub async fn edit_text(&self, request: EditMessageText) -> ApiResult<Value> {
        self.client.request(&request).await
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> ApiResult<bool> {
        self.client
            .request(&DeleteMessage {
                chat_id,
                message_id,
            })
            .await
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<String>,
    ) -> ApiResult<bool> {
        self.client
            .request(&AnswerCallbackQuery {
                callback_query_id: callback_query_id.to_string(),
                text,
                show_alert: false,
            })
            .await
    }

    pub async fn get_chat(&self, chat_id: i64) -> ApiResult<Chat> {
        self.client.request(&GetChat { chat_id }).await
    }

    // =========================================================================
    // Callback data
    // =========================================================================

    /// Stores `payload` for `route` and returns the token to put on a button.
    ///
    /// When only the store write fails the error still carries the token, see
    /// [`CallbackDataError::token`].
    pub async fn assign_callback_data<T>(
        &self,
        route: &str,
        payload: &T,
    ) -> Result<String, CallbackDataError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(payload)?;
        let token = CallbackToken::new(route, &json);
        let key = keys::callback_button_data(route, &token.action_hash);

        match self
            .store
            .set(&key, &json, self.settings.callback_data_ttl)
            .await
        {
            Ok(()) => Ok(token.to_string()),
            Err(source) => {
                error!(route, key = %key, error = %source, "Failed to store callback payload");
                Err(CallbackDataError::Persist {
                    token: token.to_string(),
                    source,
                })
            }
        }
    }

    /// Token for an inert button.
    pub async fn assign_nop_callback_data(&self) -> Result<String, CallbackDataError> {
        self.assign_callback_data(NOP_ROUTE, &Value::Null).await
    }

    /// Raw payload stored for `(route, action_hash)`. Empty values count as absent.
    pub async fn fetch_callback_payload(
        &self,
        route: &str,
        action_hash: &str,
    ) -> StorageResult<Option<String>> {
        let key = keys::callback_button_data(route, action_hash);
        Ok(self.store.get(&key).await?.filter(|raw| !raw.is_empty()))
    }

    // =========================================================================
    // Rate limiting
    // =========================================================================

    pub async fn rate_limit(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
    ) -> StorageResult<RateLimitDecision> {
        RateLimiter::new(self.store.clone())
            .check_and_count(key, limit, window)
            .await
    }

    /// Rate limit keyed by command, platform and chat.
    pub async fn rate_limit_for_command(
        &self,
        chat_id: i64,
        command: &str,
        limit: u64,
        window: Duration,
    ) -> StorageResult<RateLimitDecision> {
        let key = keys::command_rate_limit(command, &self.settings.platform, chat_id);
        self.rate_limit(&key, limit, window).await
    }

    // =========================================================================
    // Delete-later queue
    // =========================================================================

    /// Remembers a message to delete when `actor_id`'s session is cleaned up.
    pub async fn push_delete_later(
        &self,
        actor_id: i64,
        chat_id: i64,
        message_id: i64,
    ) -> StorageResult<()> {
        let group = keys::delete_later_messages_for_actor(actor_id);
        self.queue
            .push(&group, &format!("{chat_id};{message_id}"))
            .await
    }

    /// Deletes every message queued for `actor_id` and returns how many were
    /// deleted. Individual failures are logged and skipped.
    pub async fn delete_all_delete_later(&self, actor_id: i64) -> StorageResult<usize> {
        let group = keys::delete_later_messages_for_actor(actor_id);
        let entries = self.queue.pop_all(&group).await?;

        let mut deleted = 0;
        for entry in entries {
            let Some((chat_id, message_id)) = parse_delete_later_entry(&entry) else {
                warn!(actor_id, entry = %entry, "Skipping malformed delete-later entry");
                continue;
            };
            match self.delete_message(chat_id, message_id).await {
                Ok(_) => deleted += 1,
                Err(e) => {
                    error!(actor_id, chat_id, message_id, error = %e, "Failed to delete message")
                }
            }
        }
        Ok(deleted)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    pub async fn is_bot_administrator(&self, chat_id: i64) -> ApiResult<bool> {
        self.is_user_member_status(
            chat_id,
            self.client.bot_id(),
            &[MemberStatus::Administrator, MemberStatus::Creator],
        )
        .await
    }

    pub async fn is_user_member_status(
        &self,
        chat_id: i64,
        user_id: i64,
        statuses: &[MemberStatus],
    ) -> ApiResult<bool> {
        let member = self
            .client
            .request(&GetChatMember { chat_id, user_id })
            .await?;
        Ok(statuses.contains(&member.status))
    }
}

fn parse_delete_later_entry(entry: &str) -> Option<(i64, i64)> {
    let (chat_id, message_id) = entry.split_once(';')?;
    Some((chat_id.parse().ok()?, message_id.parse().ok()?))
}
