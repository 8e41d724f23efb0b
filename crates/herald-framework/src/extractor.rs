//! Extractor system.
//!
//! Handler parameters are produced from the [`Context`] through the
//! [`FromContext`] trait. If any extractor fails the handler is skipped and a
//! warning is logged. Wrap a parameter in [`Option<T>`] to make it optional.

use std::sync::Arc;

use herald_core::{Update, User};
use serde::de::DeserializeOwned;

use crate::bot::BotApi;
use crate::context::Context;
use crate::error::{ExtractError, ExtractResult};

/// A type that can be extracted from a [`Context`].
///
/// ```rust,ignore
/// struct ChatId(i64);
///
/// impl FromContext for ChatId {
///     fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
///         ctx.chat_id()
///             .map(ChatId)
///             .ok_or_else(|| ExtractError::custom("update has no chat"))
///     }
/// }
/// ```
pub trait FromContext: Sized {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self>;
}

impl FromContext for Arc<Context> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(Arc::clone(ctx))
    }
}

impl FromContext for BotApi {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(ctx.bot().clone())
    }
}

impl FromContext for Arc<Update> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(ctx.update_arc())
    }
}

/// Arguments following the command name, trimmed. Fails when the update is
/// not a command message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs(pub String);

impl FromContext for CommandArgs {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        let message = ctx.update().message.as_ref().ok_or(ExtractError::NotACommand)?;
        if message.command().is_none() {
            return Err(ExtractError::NotACommand);
        }
        Ok(CommandArgs(message.command_arguments().to_string()))
    }
}

/// The user who produced the update.
#[derive(Debug, Clone)]
pub struct Sender(pub User);

impl FromContext for Sender {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        ctx.update()
            .sent_from()
            .cloned()
            .map(Sender)
            .ok_or(ExtractError::MissingSender)
    }
}

/// The payload bound to the callback button that was pressed.
///
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct Confirm { id: i64 }
///
/// async fn on_confirm(CallbackData(confirm): CallbackData<Confirm>) -> String {
///     format!("confirmed {}", confirm.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CallbackData<T>(pub T);

impl<T: DeserializeOwned> FromContext for CallbackData<T> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(CallbackData(ctx.bind_callback_payload()?))
    }
}

impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

impl<T: FromContext> FromContext for Result<T, ExtractError> {
    fn from_context(ctx: &Arc<Context>) -> ExtractResult<Self> {
        Ok(T::from_context(ctx))
    }
}
