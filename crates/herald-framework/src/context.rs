//! Per-update handler context.

use std::sync::Arc;
use std::time::Duration;

use herald_core::{ApiError, ApiResult, Message, SendMessage, Update};
use herald_storage::StorageResult;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::bot::BotApi;
use crate::error::BindError;
use crate::handler::{EditMessageResponse, MessageResponse};
use crate::rate_limit::RateLimitDecision;

/// State for one dispatched update.
///
/// Every update gets its own context; handlers of the same update share it
/// through an `Arc`, so the mutable parts sit behind locks.
pub struct Context {
    update: Arc<Update>,
    bot: BotApi,
    aborted: Mutex<bool>,
    callback_payload: Mutex<Option<String>>,
}

impl Context {
    pub fn new(update: Arc<Update>, bot: BotApi) -> Self {
        Self {
            update,
            bot,
            aborted: Mutex::new(false),
            callback_payload: Mutex::new(None),
        }
    }

    pub fn update(&self) -> &Update {
        &self.update
    }

    pub fn update_arc(&self) -> Arc<Update> {
        Arc::clone(&self.update)
    }

    pub fn bot(&self) -> &BotApi {
        &self.bot
    }

    /// Marks the update as done. Advisory: the dispatcher does not consult it,
    /// handlers cooperating on one update may.
    pub fn abort(&self) {
        *self.aborted.lock() = true;
    }

    pub fn is_aborted(&self) -> bool {
        *self.aborted.lock()
    }

    /// Chat the update happened in.
    pub fn chat_id(&self) -> Option<i64> {
        self.update.from_chat().map(|chat| chat.id)
    }

    /// Sender's language, or the configured default locale.
    pub fn language(&self) -> String {
        self.update
            .sent_from()
            .and_then(|user| user.language_code.as_deref())
            .filter(|code| !code.is_empty())
            .unwrap_or(self.bot.settings().default_locale.as_str())
            .to_string()
    }

    /// Translates `key` into the sender's language.
    pub fn t(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.bot.t(&self.language(), key, args)
    }

    // =========================================================================
    // Callback payload
    // =========================================================================

    /// Binds the resolved payload. Only the first call has an effect.
    pub(crate) fn bind_payload(&self, raw: String) -> bool {
        let mut slot = self.callback_payload.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(raw);
        true
    }

    /// The raw JSON payload of the resolved callback, if any.
    pub fn callback_payload_raw(&self) -> Option<String> {
        self.callback_payload.lock().clone()
    }

    /// Deserializes the resolved callback payload into `T`.
    pub fn bind_callback_payload<T: DeserializeOwned>(&self) -> Result<T, BindError> {
        let slot = self.callback_payload.lock();
        let raw = slot.as_deref().ok_or(BindError::NoBoundPayload)?;
        Ok(serde_json::from_str(raw)?)
    }

    // =========================================================================
    // Replies
    // =========================================================================

    /// A message addressed to this update's chat.
    pub fn new_message(&self, text: impl Into<String>) -> MessageResponse {
        let response = MessageResponse::new(text);
        match self.chat_id() {
            Some(chat_id) => response.to_chat(chat_id),
            None => response,
        }
    }

    /// A message replying to the update's message.
    pub fn new_reply(&self, text: impl Into<String>) -> MessageResponse {
        let response = self.new_message(text);
        match self.update.message.as_ref() {
            Some(message) => response.reply_to(message.message_id),
            None => response,
        }
    }

    /// An edit of `message_id` in this update's chat.
    pub fn new_edit_message_text(
        &self,
        message_id: i64,
        text: impl Into<String>,
    ) -> EditMessageResponse {
        let response = EditMessageResponse::new(message_id).text(text);
        match self.chat_id() {
            Some(chat_id) => response.in_chat(chat_id),
            None => response,
        }
    }

    /// Sends `text` to this update's chat right away.
    pub async fn send_text(&self, text: impl Into<String>) -> ApiResult<Message> {
        let chat_id = self
            .chat_id()
            .ok_or_else(|| ApiError::Other("update has no chat to reply to".into()))?;
        self.bot.send(SendMessage::new(chat_id, text)).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Rate limit for `command` in this update's chat. Updates without a
    /// chat are always allowed.
    pub async fn rate_limit_for_command(
        &self,
        command: &str,
        limit: u64,
        window: Duration,
    ) -> StorageResult<RateLimitDecision> {
        match self.chat_id() {
            Some(chat_id) => {
                self.bot
                    .rate_limit_for_command(chat_id, command, limit, window)
                    .await
            }
            None => Ok(RateLimitDecision {
                count: 0,
                allowed: true,
            }),
        }
    }
}
