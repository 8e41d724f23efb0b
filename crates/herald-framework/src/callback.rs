//! Callback-query tokens.
//!
//! A button never carries its payload. It carries a token
//! `"<route hash>;<action data hash>"`, each half being the first 16 hex
//! characters of a SHA-256 digest. The payload itself lives in the store
//! under `callback_query/button_data/{route}/{action hash}`.

use std::fmt;

use sha2::{Digest, Sha256};

/// Route pre-registered with a handler that does nothing, for buttons that
/// should be inert.
pub const NOP_ROUTE: &str = "nop";

const HASH_LEN: usize = 16;
const SEPARATOR: char = ';';

fn sha256_prefix(data: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(data));
    digest[..HASH_LEN].to_string()
}

/// Hash identifying a route on the wire.
pub fn route_hash(route: &str) -> String {
    sha256_prefix(route.as_bytes())
}

/// Content address of a serialized payload.
pub fn action_data_hash(payload_json: &str) -> String {
    sha256_prefix(payload_json.as_bytes())
}

/// The datum round-tripped through the client as callback data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallbackToken {
    pub route_hash: String,
    pub action_hash: String,
}

impl CallbackToken {
    /// Token for `route` carrying the already serialized payload.
    pub fn new(route: &str, payload_json: &str) -> Self {
        Self {
            route_hash: route_hash(route),
            action_hash: action_data_hash(payload_json),
        }
    }

    /// Parses callback data. Exactly two non-empty `;`-separated parts are
    /// required.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(SEPARATOR);
        let (route_hash, action_hash) = (parts.next()?, parts.next()?);
        if parts.next().is_some() || route_hash.is_empty() || action_hash.is_empty() {
            return None;
        }

        Some(Self {
            route_hash: route_hash.to_string(),
            action_hash: action_hash.to_string(),
        })
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.route_hash, self.action_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        let hash = route_hash("confirm");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, route_hash("confirm"));
        assert_eq!(route_hash(""), "e3b0c44298fc1c14");
    }

    #[test]
    fn test_distinct_inputs_distinct_hashes() {
        assert_ne!(route_hash("confirm"), route_hash("cancel"));
        assert_ne!(action_data_hash(r#"{"id":42}"#), action_data_hash(r#"{"id":43}"#));
    }

    #[test]
    fn test_token_round_trip() {
        let token = CallbackToken::new("confirm", r#"{"id":42}"#);
        let wire = token.to_string();
        assert_eq!(wire.len(), 33);
        assert_eq!(CallbackToken::parse(&wire), Some(token));
    }

    #[test]
    fn test_malformed_tokens() {
        for data in ["", ";", "abc", "abc;", ";def", "a;b;c"] {
            assert_eq!(CallbackToken::parse(data), None, "{data:?}");
        }
        assert!(CallbackToken::parse("00000000;00000000").is_some());
    }
}
