//! Handler return values.

use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{
    ChatClientExt, EditMessageReplyMarkup, EditMessageText, InlineKeyboardMarkup, Message,
    ParseMode, SendMessage,
};
use tracing::{error, warn};

use crate::context::Context;
use crate::error::{HandlerError, MessageError};

// ============================================================================
// HandlerResponse - Handle handler return values
// ============================================================================

/// A value a handler returns; consumed after the handler finishes.
#[async_trait]
pub trait HandlerResponse: Send {
    async fn into_response(self, ctx: Arc<Context>);
}

#[async_trait]
impl HandlerResponse for () {
    async fn into_response(self, _ctx: Arc<Context>) {}
}

/// Sends the text to the update's chat.
#[async_trait]
impl HandlerResponse for String {
    async fn into_response(self, ctx: Arc<Context>) {
        ctx.new_message(self).deliver(&ctx).await;
    }
}

#[async_trait]
impl HandlerResponse for &'static str {
    async fn into_response(self, ctx: Arc<Context>) {
        ctx.new_message(self).deliver(&ctx).await;
    }
}

#[async_trait]
impl HandlerResponse for MessageResponse {
    async fn into_response(self, ctx: Arc<Context>) {
        self.deliver(&ctx).await;
    }
}

#[async_trait]
impl HandlerResponse for EditMessageResponse {
    async fn into_response(self, ctx: Arc<Context>) {
        self.deliver(&ctx).await;
    }
}

#[async_trait]
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    async fn into_response(self, ctx: Arc<Context>) {
        if let Some(t) = self {
            t.into_response(ctx).await;
        }
    }
}

/// On `Err`, message errors are shown to the user and exceptions are logged.
#[async_trait]
impl<T, E> HandlerResponse for Result<T, E>
where
    T: HandlerResponse,
    E: Into<HandlerError> + Send,
{
    async fn into_response(self, ctx: Arc<Context>) {
        match self {
            Ok(t) => t.into_response(ctx).await,
            Err(e) => handle_error(e.into(), &ctx).await,
        }
    }
}

pub(crate) async fn handle_error(err: HandlerError, ctx: &Context) {
    match err {
        HandlerError::Message(message) => deliver_message_error(message, ctx).await,
        HandlerError::Exception(exception) => {
            error!(
                update_id = ctx.update().update_id,
                error = %exception.error(),
                location = %exception.location(),
                "Handler raised an exception"
            );
            if let Some(reply) = exception.reply {
                deliver_message_error(reply, ctx).await;
            }
        }
    }
}

async fn deliver_message_error(err: MessageError, ctx: &Context) {
    if let Some(message_id) = err.edit_message_id {
        let mut edit = ctx.new_edit_message_text(message_id, err.text);
        edit.parse_mode = err.parse_mode;
        edit.reply_markup = err.reply_markup;
        edit.deliver(ctx).await;
        return;
    }

    let mut response = ctx.new_message(err.text);
    response.reply_to_message_id = err.reply_to_message_id;
    response.parse_mode = err.parse_mode;
    response.reply_markup = err.reply_markup;
    response.delete_later_for = err.delete_later_for;
    response.deliver(ctx).await;
}

// ============================================================================
// MessageResponse
// ============================================================================

/// A new message to send. Without an explicit chat it goes to the update's chat.
#[derive(Debug, Clone)]
pub struct MessageResponse {
    pub(crate) chat_id: Option<i64>,
    pub(crate) text: String,
    pub(crate) parse_mode: Option<ParseMode>,
    pub(crate) reply_to_message_id: Option<i64>,
    pub(crate) reply_markup: Option<InlineKeyboardMarkup>,
    pub(crate) delete_later_for: Option<i64>,
}

impl MessageResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            chat_id: None,
            text: text.into(),
            parse_mode: None,
            reply_to_message_id: None,
            reply_markup: None,
            delete_later_for: None,
        }
    }

    pub fn to_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn html(self) -> Self {
        self.parse_mode(ParseMode::Html)
    }

    pub fn reply_markup(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }

    /// Queue the sent message for deletion when `actor_id`'s session is cleaned up.
    pub fn delete_later(mut self, actor_id: i64) -> Self {
        self.delete_later_for = Some(actor_id);
        self
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.chat_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Sends the message, logging failures. Returns the sent message.
    pub async fn deliver(self, ctx: &Context) -> Option<Message> {
        let Some(chat_id) = self.chat_id.or_else(|| ctx.chat_id()) else {
            warn!(
                update_id = ctx.update().update_id,
                "Dropping response: no chat to send it to"
            );
            return None;
        };

        let request = SendMessage {
            chat_id,
            text: self.text,
            parse_mode: self.parse_mode,
            reply_to_message_id: self.reply_to_message_id,
            reply_markup: self.reply_markup,
        };
        let sent = ctx.bot().may_send(request).await?;

        if let Some(actor_id) = self.delete_later_for
            && let Err(e) = ctx
                .bot()
                .push_delete_later(actor_id, sent.chat.id, sent.message_id)
                .await
        {
            error!(actor_id, error = %e, "Failed to queue message for deletion");
        }
        Some(sent)
    }
}

// ============================================================================
// EditMessageResponse
// ============================================================================

/// An edit of an existing message. Without text only the keyboard changes.
#[derive(Debug, Clone)]
pub struct EditMessageResponse {
    pub(crate) chat_id: Option<i64>,
    pub(crate) message_id: i64,
    pub(crate) text: Option<String>,
    pub(crate) parse_mode: Option<ParseMode>,
    pub(crate) reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageResponse {
    pub fn new(message_id: i64) -> Self {
        Self {
            chat_id: None,
            message_id,
            text: None,
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn in_chat(mut self, chat_id: i64) -> Self {
        self.chat_id = Some(chat_id);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_markup(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }

    pub async fn deliver(self, ctx: &Context) {
        let Some(chat_id) = self.chat_id.or_else(|| ctx.chat_id()) else {
            warn!(
                update_id = ctx.update().update_id,
                "Dropping edit: no chat to edit in"
            );
            return;
        };
        let client = ctx.bot().client();

        let result = match self.text {
            Some(text) => client
                .request(&EditMessageText {
                    chat_id,
                    message_id: self.message_id,
                    text,
                    parse_mode: self.parse_mode,
                    reply_markup: self.reply_markup,
                })
                .await
                .map(drop),
            None => client
                .request(&EditMessageReplyMarkup {
                    chat_id,
                    message_id: self.message_id,
                    reply_markup: self.reply_markup,
                })
                .await
                .map(drop),
        };
        if let Err(e) = result {
            error!(chat_id, message_id = self.message_id, error = %e, "Failed to edit message");
        }
    }
}
