//! Chat-platform entities carried inside updates.
//!
//! Field names follow the platform's JSON wire format so that payloads can be
//! deserialized directly. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// The user id the platform uses when an anonymous group administrator acts.
pub const GROUP_ANONYMOUS_BOT_ID: i64 = 1_087_968_824;

// =============================================================================
// Users and chats
// =============================================================================

/// A platform user or bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl User {
    /// Joins first and last name.
    ///
    /// CJK names are written family name first, so when the last name is CJK
    /// it leads.
    pub fn full_name(&self) -> String {
        let first = self.first_name.as_str();
        let last = self.last_name.as_deref().unwrap_or_default();

        match (first.is_empty(), last.is_empty()) {
            (_, true) => first.to_string(),
            (true, false) => last.to_string(),
            _ if contains_cjk(last) => format!("{last} {first}"),
            _ => format!("{first} {last}"),
        }
    }

    /// Human readable identity used in logs: `Full Name (@username)`.
    pub fn identity(&self) -> String {
        match &self.username {
            Some(username) => format!("{} (@{username})", self.full_name()),
            None => self.full_name(),
        }
    }

    /// Whether this user is the placeholder for an anonymous group administrator.
    pub fn is_group_anonymous_bot(&self) -> bool {
        self.id == GROUP_ANONYMOUS_BOT_ID
    }
}

fn contains_cjk(s: &str) -> bool {
    s.chars().any(|c| {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{3040}'..='\u{30FF}'
            | '\u{AC00}'..='\u{D7AF}')
    })
}

/// Kind of chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
    #[serde(other)]
    Unknown,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Group => "group",
            Self::Supergroup => "supergroup",
            Self::Channel => "channel",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat (private conversation, group, supergroup or channel).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: ChatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == ChatType::Private
    }

    pub fn is_group_or_supergroup(&self) -> bool {
        matches!(self.kind, ChatType::Group | ChatType::Supergroup)
    }

    pub fn is_channel(&self) -> bool {
        self.kind == ChatType::Channel
    }

    /// Title for groups and channels, the user's name for private chats.
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Membership status of a user inside a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Kicked => "kicked",
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's membership record in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMember {
    pub user: User,
    pub status: MemberStatus,
}

/// Change of a chat member's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    #[serde(default)]
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

/// A request to join a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
    #[serde(default)]
    pub date: i64,
}

// =============================================================================
// Messages
// =============================================================================

/// Formatting mode for outgoing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "MarkdownV2")]
    MarkdownV2,
}

/// A message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_chat: Option<Chat>,
    #[serde(default)]
    pub date: i64,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_chat_members: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_chat_member: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_from_chat_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl Message {
    /// The leading `/command` of the text, without the slash and without an
    /// `@botname` suffix.
    pub fn command(&self) -> Option<&str> {
        let token = self.text.as_deref()?.split_whitespace().next()?;
        let command = token.strip_prefix('/')?;
        let command = command.split_once('@').map_or(command, |(name, _)| name);

        (!command.is_empty()).then_some(command)
    }

    /// Everything after the command token, trimmed. Empty when the message is
    /// not a command.
    pub fn command_arguments(&self) -> &str {
        if self.command().is_none() {
            return "";
        }
        let text = self.text.as_deref().unwrap_or_default().trim_start();
        text.split_once(char::is_whitespace)
            .map_or("", |(_, rest)| rest.trim())
    }

    pub fn has_new_chat_members(&self) -> bool {
        self.new_chat_members
            .as_ref()
            .is_some_and(|members| !members.is_empty())
    }
}

// =============================================================================
// Queries and polls
// =============================================================================

/// An interaction with an inline keyboard button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    #[serde(default)]
    pub chat_instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub offset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub invoice_payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub total_amount: i64,
    #[serde(default)]
    pub invoice_payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAnswer {
    pub poll_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default)]
    pub option_ids: Vec<i64>,
}

// =============================================================================
// Keyboards
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(text: &str) -> Message {
        Message {
            message_id: 1,
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(text_message("/ping").command(), Some("ping"));
        assert_eq!(text_message("/ping@herald_bot extra").command(), Some("ping"));
        assert_eq!(text_message("ping").command(), None);
        assert_eq!(text_message("/").command(), None);
        assert_eq!(text_message("/@bot").command(), None);

        let msg = text_message("/echo  hello world ");
        assert_eq!(msg.command(), Some("echo"));
        assert_eq!(msg.command_arguments(), "hello world");
        assert_eq!(text_message("/ping").command_arguments(), "");
        assert_eq!(text_message("hello world").command_arguments(), "");
    }

    #[test]
    fn test_full_name_ordering() {
        let user = |first: &str, last: Option<&str>| User {
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
            ..Default::default()
        };

        assert_eq!(user("Ada", Some("Lovelace")).full_name(), "Ada Lovelace");
        assert_eq!(user("Ada", None).full_name(), "Ada");
        assert_eq!(user("", Some("Lovelace")).full_name(), "Lovelace");
        assert_eq!(user("小明", Some("王")).full_name(), "王 小明");
        assert_eq!(user("小明", Some("Wang")).full_name(), "小明 Wang");
    }

    #[test]
    fn test_chat_type_deserialize_unknown() {
        let chat: Chat = serde_json::from_str(r#"{"id": 1, "type": "forum"}"#).unwrap();
        assert_eq!(chat.kind, ChatType::Unknown);

        let chat: Chat = serde_json::from_str(r#"{"id": -5, "type": "supergroup", "title": "Rustaceans"}"#).unwrap();
        assert!(chat.is_group_or_supergroup());
        assert_eq!(chat.display_title(), "Rustaceans");
    }

    #[test]
    fn test_anonymous_admin() {
        let user = User {
            id: GROUP_ANONYMOUS_BOT_ID,
            is_bot: true,
            first_name: "Group".into(),
            ..Default::default()
        };
        assert!(user.is_group_anonymous_bot());
    }
}
