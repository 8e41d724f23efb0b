//! Error types for chat-platform API calls.

use thiserror::Error;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error type for API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never reached the platform or the response was lost.
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform rejected the request.
    #[error("api error ({code}): {description}")]
    Rejected {
        /// Platform error code (HTTP-like).
        code: i64,
        /// Human readable description returned by the platform.
        description: String,
    },

    /// Failed to serialize a request or deserialize a response.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Creates a rejection error.
    pub fn rejected(code: i64, description: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            description: description.into(),
        }
    }

    /// Returns the platform error code when the platform rejected the call.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The user blocked the bot, so private messages can no longer be delivered.
    pub fn is_bot_blocked_by_user(&self) -> bool {
        matches!(
            self,
            Self::Rejected { code: 403, description } if description.contains("bot was blocked by the user")
        )
    }

    /// The user never started a private conversation with the bot.
    pub fn is_cannot_initiate_chat(&self) -> bool {
        matches!(
            self,
            Self::Rejected { code: 403, description } if description.contains("bot can't initiate conversation with a user")
        )
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
