//! Error types for the Herald framework.

use std::error::Error as StdError;
use std::panic::Location;

use herald_core::{ApiError, InlineKeyboardMarkup, ParseMode};
use herald_storage::StorageError;
use thiserror::Error;

// =============================================================================
// Extraction
// =============================================================================

/// Errors that can occur during context extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The update does not carry a command message.
    #[error("update is not a command message")]
    NotACommand,

    /// The update has no identifiable sender.
    #[error("update has no sender")]
    MissingSender,

    /// The callback payload could not be bound.
    #[error(transparent)]
    Payload(#[from] BindError),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Failure to bind the resolved callback payload into a handler's type.
#[derive(Debug, Error)]
pub enum BindError {
    /// Called outside a resolved callback-query dispatch.
    #[error("no bound payload")]
    NoBoundPayload,

    /// The stored payload does not match the requested type.
    #[error("callback payload does not match the requested type: {0}")]
    Mismatch(#[from] serde_json::Error),
}

/// Failure to issue a callback token.
#[derive(Debug, Error)]
pub enum CallbackDataError {
    /// The payload could not be serialized; no token exists.
    #[error("failed to serialize callback payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The token was computed but its payload was not stored. The token is
    /// still usable on an outgoing control; it will simply never resolve.
    #[error("failed to store callback payload for token {token}: {source}")]
    Persist {
        token: String,
        #[source]
        source: StorageError,
    },
}

impl CallbackDataError {
    /// The best-effort token, when one could be computed.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Serialize(_) => None,
            Self::Persist { token, .. } => Some(token),
        }
    }
}

// =============================================================================
// Handler errors
// =============================================================================

/// An error a handler wants shown to the user as a message.
#[derive(Debug, Clone, Error)]
#[error("{text}")]
pub struct MessageError {
    pub(crate) text: String,
    pub(crate) reply_to_message_id: Option<i64>,
    pub(crate) edit_message_id: Option<i64>,
    pub(crate) parse_mode: Option<ParseMode>,
    pub(crate) reply_markup: Option<InlineKeyboardMarkup>,
    pub(crate) delete_later_for: Option<i64>,
}

impl MessageError {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_to_message_id: None,
            edit_message_id: None,
            parse_mode: None,
            reply_markup: None,
            delete_later_for: None,
        }
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    /// Edit this message in place instead of sending a new one.
    pub fn edit(mut self, message_id: i64) -> Self {
        self.edit_message_id = Some(message_id);
        self
    }

    pub fn html(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Html);
        self
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

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// An unexpected failure inside a handler. Logged with the location where it
/// was raised; optionally also replies to the user.
#[derive(Debug, Error)]
#[error("{error} (at {location})")]
pub struct ExceptionError {
    error: Box<dyn StdError + Send + Sync>,
    location: &'static Location<'static>,
    pub(crate) reply: Option<MessageError>,
}

impl ExceptionError {
    #[track_caller]
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            error: err.into(),
            location: Location::caller(),
            reply: None,
        }
    }

    pub fn with_reply(mut self, reply: MessageError) -> Self {
        self.reply = Some(reply);
        self
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn error(&self) -> &(dyn StdError + Send + Sync) {
        self.error.as_ref()
    }
}

/// The error type handlers return.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Exception(#[from] ExceptionError),
}

impl HandlerError {
    /// Shorthand for an [`ExceptionError`] captured at the caller.
    #[track_caller]
    pub fn exception(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Exception(ExceptionError::new(err))
    }
}

macro_rules! impl_exception_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for HandlerError {
                #[track_caller]
                fn from(err: $err) -> Self {
                    Self::Exception(ExceptionError::new(err))
                }
            }
        )*
    };
}

impl_exception_from!(
    ApiError,
    StorageError,
    BindError,
    ExtractError,
    CallbackDataError,
    serde_json::Error,
);

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failing() -> HandlerResult<()> {
        Err::<(), _>(ApiError::Transport("connection reset".into()))?;
        Ok(())
    }

    #[test]
    fn test_question_mark_records_location() {
        let err = failing().unwrap_err();
        let HandlerError::Exception(exception) = err else {
            panic!("expected an exception");
        };
        assert!(exception.location().file().ends_with("error.rs"));
        assert!(exception.to_string().contains("connection reset"));
    }

    #[test]
    fn test_callback_data_error_token() {
        let err = CallbackDataError::Persist {
            token: "a;b".into(),
            source: StorageError::corrupt("k", "bad"),
        };
        assert_eq!(err.token(), Some("a;b"));
    }
}
