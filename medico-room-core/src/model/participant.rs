use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier the signaling server assigns to every connected client.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First frame sent on every signaling connection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

impl Identity {
    /// Fills in whatever the caller did not supply: a random user id and a
    /// `Guest-xxxx` display name derived from it.
    pub fn new(user_id: Option<String>, username: Option<String>) -> Self {
        let user_id = user_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let username = username.unwrap_or_else(|| {
            let suffix: String = user_id
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(4)
                .collect();
            format!("Guest-{suffix}")
        });

        Self { user_id, username }
    }
}
