//! Chat-platform client capability.
//!
//! The framework never talks to the network directly. Transports implement
//! [`ChatClient::call_api`]; typed requests are layered on top through
//! [`ApiRequest`] and [`ChatClientExt`].

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiResult;
use crate::types::{Chat, ChatMember, InlineKeyboardMarkup, Message, ParseMode};

/// A connection to the chat platform.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// User id of the bot account behind this client.
    fn bot_id(&self) -> i64;

    /// Calls a platform method with JSON parameters and returns the raw result.
    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value>;
}

/// A typed platform request.
pub trait ApiRequest: Serialize + Send + Sync {
    /// Platform method name.
    const METHOD: &'static str;

    /// Decoded result.
    type Response: DeserializeOwned + Send;
}

/// Typed helpers available on every [`ChatClient`].
#[async_trait]
pub trait ChatClientExt: ChatClient {
    /// Sends a typed request and decodes its result.
    async fn request<R: ApiRequest>(&self, request: &R) -> ApiResult<R::Response>;
}

#[async_trait]
impl<C: ChatClient + ?Sized> ChatClientExt for C {
    async fn request<R: ApiRequest>(&self, request: &R) -> ApiResult<R::Response> {
        let params = serde_json::to_value(request)?;
        let value = self.call_api(R::METHOD, params).await?;
        Ok(serde_json::from_value(value)?)
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            reply_to_message_id: None,
            reply_markup: None,
        }
    }
}

impl ApiRequest for SendMessage {
    const METHOD: &'static str = "sendMessage";
    type Response = Message;
}

/// Replaces the text of a sent message. The platform answers with the edited
/// message or `true` for inline messages, so the raw value is returned.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageText {
    pub fn new(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }
}

impl ApiRequest for EditMessageText {
    const METHOD: &'static str = "editMessageText";
    type Response = Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageReplyMarkup {
    pub chat_id: i64,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl ApiRequest for EditMessageReplyMarkup {
    const METHOD: &'static str = "editMessageReplyMarkup";
    type Response = Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteMessage {
    pub chat_id: i64,
    pub message_id: i64,
}

impl ApiRequest for DeleteMessage {
    const METHOD: &'static str = "deleteMessage";
    type Response = bool;
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub show_alert: bool,
}

impl ApiRequest for AnswerCallbackQuery {
    const METHOD: &'static str = "answerCallbackQuery";
    type Response = bool;
}

#[derive(Debug, Clone, Serialize)]
pub struct GetChatMember {
    pub chat_id: i64,
    pub user_id: i64,
}

impl ApiRequest for GetChatMember {
    const METHOD: &'static str = "getChatMember";
    type Response = ChatMember;
}

#[derive(Debug, Clone, Serialize)]
pub struct GetChat {
    pub chat_id: i64,
}

impl ApiRequest for GetChat {
    const METHOD: &'static str = "getChat";
    type Response = Chat;
}
