use crate::utils::SYSTEM_SENDER_LABEL;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    System,
    User,
}

/// One entry of the room chat log. Never mutated after creation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: ChatKind,
}

impl ChatMessage {
    pub fn user(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(sender.into(), content.into(), ChatKind::User)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(SYSTEM_SENDER_LABEL.to_owned(), content.into(), ChatKind::System)
    }

    fn new(sender: String, content: String, kind: ChatKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content,
            timestamp: Utc::now(),
            kind,
        }
    }
}
