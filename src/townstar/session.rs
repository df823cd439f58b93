//! Town Star API session token.

use chrono::{DateTime, Utc};
use rand::RngCore;
use std::fmt::Write;

/// Random bytes in a session id (hex encoded to twice as many characters).
pub const SESSION_ID_BYTES: usize = 24;

/// Capability token sent as `x-sessionid`. Owned by the client that
/// authenticated it; a fresh one is minted whenever the API rejects the old.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownStarSession {
    id: String,
    created_at: DateTime<Utc>,
}

impl TownStarSession {
    /// Mint a new random session id.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let mut id = String::with_capacity(SESSION_ID_BYTES * 2);
        for b in bytes {
            let _ = write!(id, "{:02x}", b);
        }
        Self {
            id,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_48_hex_chars_and_unique() {
        let a = TownStarSession::generate();
        let b = TownStarSession::generate();
        assert_eq!(a.id().len(), SESSION_ID_BYTES * 2);
        assert!(a.id().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a.id(), b.id());
        assert!(a.created_at() <= Utc::now());
    }
}
