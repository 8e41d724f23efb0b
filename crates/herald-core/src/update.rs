//! Inbound updates and their classification.

use serde::{Deserialize, Serialize};

use crate::types::{
    CallbackQuery, Chat, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery,
    Message, Poll, PollAnswer, PreCheckoutQuery, ShippingQuery, User,
};

/// One inbound event from the chat platform.
///
/// Exactly one of the optional payloads is expected to be populated. Updates
/// are immutable once constructed by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_query: Option<InlineQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_inline_result: Option<ChosenInlineResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_query: Option<ShippingQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_checkout_query: Option<PreCheckoutQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_answer: Option<PollAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_chat_member: Option<ChatMemberUpdated>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_member: Option<ChatMemberUpdated>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_join_request: Option<ChatJoinRequest>,
}

/// Classification tag of an [`Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateType {
    Message,
    NewChatMembers,
    LeftChatMember,
    ChatMigrationFrom,
    ChatMigrationTo,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
    PollAnswer,
    MyChatMember,
    ChatMember,
    ChatJoinRequest,
    Unknown,
}

impl UpdateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::NewChatMembers => "new_chat_members",
            Self::LeftChatMember => "left_chat_member",
            Self::ChatMigrationFrom => "chat_migration_from",
            Self::ChatMigrationTo => "chat_migration_to",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::EditedChannelPost => "edited_channel_post",
            Self::InlineQuery => "inline_query",
            Self::ChosenInlineResult => "chosen_inline_result",
            Self::CallbackQuery => "callback_query",
            Self::ShippingQuery => "shipping_query",
            Self::PreCheckoutQuery => "pre_checkout_query",
            Self::Poll => "poll",
            Self::PollAnswer => "poll_answer",
            Self::MyChatMember => "my_chat_member",
            Self::ChatMember => "chat_member",
            Self::ChatJoinRequest => "chat_join_request",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn classify_message(message: &Message) -> UpdateType {
    if message.has_new_chat_members() {
        UpdateType::NewChatMembers
    } else if message.left_chat_member.is_some() {
        UpdateType::LeftChatMember
    } else if message.migrate_from_chat_id.is_some_and(|id| id != 0) {
        UpdateType::ChatMigrationFrom
    } else if message.migrate_to_chat_id.is_some_and(|id| id != 0) {
        UpdateType::ChatMigrationTo
    } else {
        UpdateType::Message
    }
}

impl Update {
    /// Classifies the update. Total: anything unrecognised is [`UpdateType::Unknown`].
    ///
    /// Service messages sharing the `message` shape are checked first-match-wins:
    /// new members, left member, migration from, migration to, then a plain message.
    pub fn update_type(&self) -> UpdateType {
        if let Some(message) = &self.message {
            return classify_message(message);
        }

        let shapes = [
            (self.edited_message.is_some(), UpdateType::EditedMessage),
            (self.channel_post.is_some(), UpdateType::ChannelPost),
            (self.edited_channel_post.is_some(), UpdateType::EditedChannelPost),
            (self.inline_query.is_some(), UpdateType::InlineQuery),
            (self.chosen_inline_result.is_some(), UpdateType::ChosenInlineResult),
            (self.callback_query.is_some(), UpdateType::CallbackQuery),
            (self.shipping_query.is_some(), UpdateType::ShippingQuery),
            (self.pre_checkout_query.is_some(), UpdateType::PreCheckoutQuery),
            (self.poll.is_some(), UpdateType::Poll),
            (self.poll_answer.is_some(), UpdateType::PollAnswer),
            (self.my_chat_member.is_some(), UpdateType::MyChatMember),
            (self.chat_member.is_some(), UpdateType::ChatMember),
            (self.chat_join_request.is_some(), UpdateType::ChatJoinRequest),
        ];

        shapes
            .into_iter()
            .find_map(|(present, kind)| present.then_some(kind))
            .unwrap_or(UpdateType::Unknown)
    }

    /// The user who caused the update, if any.
    pub fn sent_from(&self) -> Option<&User> {
        if let Some(message) = self.message.as_ref().or(self.edited_message.as_ref()) {
            return message.from.as_ref();
        }
        if let Some(post) = self.channel_post.as_ref().or(self.edited_channel_post.as_ref()) {
            return post.from.as_ref();
        }

        self.callback_query
            .as_ref()
            .map(|q| &q.from)
            .or_else(|| self.inline_query.as_ref().map(|q| &q.from))
            .or_else(|| self.chosen_inline_result.as_ref().map(|r| &r.from))
            .or_else(|| self.shipping_query.as_ref().map(|q| &q.from))
            .or_else(|| self.pre_checkout_query.as_ref().map(|q| &q.from))
            .or_else(|| self.poll_answer.as_ref().and_then(|a| a.user.as_ref()))
            .or_else(|| self.my_chat_member.as_ref().map(|m| &m.from))
            .or_else(|| self.chat_member.as_ref().map(|m| &m.from))
            .or_else(|| self.chat_join_request.as_ref().map(|r| &r.from))
    }

    /// The chat the update happened in, if any.
    pub fn from_chat(&self) -> Option<&Chat> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .or(self.edited_channel_post.as_ref())
            .map(|m| &m.chat)
            .or_else(|| {
                self.callback_query
                    .as_ref()
                    .and_then(|q| q.message.as_ref())
                    .map(|m| &m.chat)
            })
            .or_else(|| self.my_chat_member.as_ref().map(|m| &m.chat))
            .or_else(|| self.chat_member.as_ref().map(|m| &m.chat))
            .or_else(|| self.chat_join_request.as_ref().map(|r| &r.chat))
    }

    /// The message carried by the update, including the one a callback query is attached to.
    pub fn effective_message(&self) -> Option<&Message> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.channel_post.as_ref())
            .or(self.edited_channel_post.as_ref())
            .or_else(|| self.callback_query.as_ref().and_then(|q| q.message.as_ref()))
    }
}
