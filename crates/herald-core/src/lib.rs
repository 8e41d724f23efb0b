//! # Herald Core
//!
//! Platform-facing building blocks of the Herald bot framework:
//!
//! - **Update model**: [`Update`] and the entities it carries, deserializable
//!   straight from the platform's JSON.
//! - **Classification**: [`Update::update_type`] maps every update onto exactly
//!   one [`UpdateType`].
//! - **Client capability**: [`ChatClient`] is implemented by transports;
//!   typed requests go through [`ChatClientExt::request`].
//! - **Localisation capability**: [`Translator`] and the bundled
//!   [`StaticTranslator`].

pub mod client;
pub mod error;
pub mod i18n;
pub mod types;
pub mod update;

pub use client::{
    AnswerCallbackQuery, ApiRequest, ChatClient, ChatClientExt, DeleteMessage,
    EditMessageReplyMarkup, EditMessageText, GetChat, GetChatMember, SendMessage,
};
pub use error::{ApiError, ApiResult};
pub use i18n::{FALLBACK_LOCALE, StaticTranslator, Translator};
pub use types::{
    CallbackQuery, Chat, ChatJoinRequest, ChatMember, ChatMemberUpdated, ChatType,
    ChosenInlineResult, GROUP_ANONYMOUS_BOT_ID, InlineKeyboardButton, InlineKeyboardMarkup,
    InlineQuery, MemberStatus, Message, ParseMode, Poll, PollAnswer, PreCheckoutQuery,
    ShippingQuery, User,
};
pub use update::{Update, UpdateType};

// Re-export for downstream crates implementing ChatClient
pub use async_trait::async_trait;
