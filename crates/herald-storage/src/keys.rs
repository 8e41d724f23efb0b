//! Namespaced key layout shared by every backend.
//!
//! Keys are formatted as `domain/subject/qualifier...` so features never
//! collide inside one store.

/// Stored callback payload.
///
/// `callback_query/button_data/{route}/{action_hash}`
pub fn callback_button_data(route: &str, action_hash: &str) -> String {
    format!("callback_query/button_data/{route}/{action_hash}")
}

/// Per-chat command rate-limit counter.
///
/// `rate_limit/{command}/{platform}/{chat_id}`
pub fn command_rate_limit(command: &str, platform: &str, chat_id: i64) -> String {
    format!("rate_limit/{command}/{platform}/{chat_id}")
}

/// Messages queued for deletion on behalf of an actor.
///
/// `session/delete_later_messages_for_actor/{actor_id}`
pub fn delete_later_messages_for_actor(actor_id: i64) -> String {
    format!("session/delete_later_messages_for_actor/{actor_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            callback_button_data("confirm", "0123456789abcdef"),
            "callback_query/button_data/confirm/0123456789abcdef"
        );
        assert_eq!(
            command_rate_limit("recap", "telegram", -1001),
            "rate_limit/recap/telegram/-1001"
        );
        assert_eq!(
            delete_later_messages_for_actor(7),
            "session/delete_later_messages_for_actor/7"
        );
    }
}
