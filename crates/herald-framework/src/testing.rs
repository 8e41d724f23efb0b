//! Test doubles shared by the unit tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use herald_core::{
    ApiError, ApiResult, CallbackQuery, Chat, ChatClient, ChatType, MemberStatus, Message, Update,
    User,
};
use herald_storage::Storage;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::bot::BotApi;

/// Records every call and answers with canned platform responses.
pub(crate) struct MockClient {
    calls: Mutex<Vec<(String, Value)>>,
    member_status: Mutex<MemberStatus>,
    failing: Mutex<HashSet<String>>,
    next_message_id: AtomicI64,
}

impl MockClient {
    pub(crate) const BOT_ID: i64 = 4242;

    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            member_status: Mutex::new(MemberStatus::Member),
            failing: Mutex::new(HashSet::new()),
            next_message_id: AtomicI64::new(1000),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub(crate) fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub(crate) fn set_member_status(&self, status: MemberStatus) {
        *self.member_status.lock() = status;
    }

    /// Makes `method` fail with a platform rejection.
    pub(crate) fn fail(&self, method: &str) {
        self.failing.lock().insert(method.to_string());
    }
}

#[async_trait]
impl ChatClient for MockClient {
    fn bot_id(&self) -> i64 {
        Self::BOT_ID
    }

    async fn call_api(&self, method: &str, params: Value) -> ApiResult<Value> {
        self.calls.lock().push((method.to_string(), params.clone()));
        if self.failing.lock().contains(method) {
            return Err(ApiError::rejected(400, "Bad Request: mocked failure"));
        }

        let response = match method {
            "sendMessage" => json!({
                "message_id": self.next_message_id.fetch_add(1, Ordering::SeqCst),
                "date": 0,
                "chat": { "id": params["chat_id"], "type": "private" },
                "text": params["text"],
            }),
            "getChatMember" => json!({
                "user": { "id": params["user_id"], "is_bot": false, "first_name": "Member" },
                "status": *self.member_status.lock(),
            }),
            "getChat" => json!({
                "id": params["chat_id"],
                "type": "channel",
                "title": "Announcements",
            }),
            _ => Value::Bool(true),
        };
        Ok(response)
    }
}

pub(crate) fn test_bot() -> (BotApi, Arc<MockClient>) {
    let client = Arc::new(MockClient::new());
    let (storage, _) = Storage::in_memory();
    (BotApi::new(client.clone(), storage), client)
}

fn user(user_id: i64) -> User {
    User {
        id: user_id,
        first_name: "Alice".into(),
        ..Default::default()
    }
}

/// A text message in a private chat. The message id is always 1.
pub(crate) fn message_update(chat_id: i64, user_id: i64, text: &str) -> Update {
    Update {
        update_id: 1,
        message: Some(Message {
            message_id: 1,
            from: Some(user(user_id)),
            chat: Chat {
                id: chat_id,
                kind: ChatType::Private,
                ..Default::default()
            },
            text: Some(text.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A button press carrying `data`, attached to message 77 in chat 10.
pub(crate) fn callback_update(data: &str) -> Update {
    Update {
        update_id: 2,
        callback_query: Some(CallbackQuery {
            id: "cbq-1".into(),
            from: user(20),
            message: Some(Message {
                message_id: 77,
                chat: Chat {
                    id: 10,
                    kind: ChatType::Private,
                    ..Default::default()
                },
                ..Default::default()
            }),
            data: Some(data.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
