use medico_room_core::utils::LOCAL_SENDER_LABEL;
use medico_room_core::{ChatMessage, ParticipantId, SignalingMessage};
use std::sync::Arc;

use crate::signaling::SignalingOutput;

const UNKNOWN_SENDER: &str = "Unknown";

/// Room chat multiplexed over the signaling channel.
///
/// History is append-only and ordered by arrival. Join and leave
/// notifications are interleaved as system entries.
pub struct ChatChannel {
    output: Arc<dyn SignalingOutput>,
    history: Vec<ChatMessage>,
    unread: usize,
}

impl ChatChannel {
    pub fn new(output: Arc<dyn SignalingOutput>) -> Self {
        Self {
            output,
            history: Vec::new(),
            unread: 0,
        }
    }

    /// Sends `text` and appends the local copy right away. There is no
    /// delivery receipt. Blank text is ignored.
    pub fn send(&mut self, text: &str) -> Option<ChatMessage> {
        if text.trim().is_empty() {
            return None;
        }

        self.output.send_chat(text.to_owned());
        Some(self.push(ChatMessage::user(LOCAL_SENDER_LABEL, text)))
    }

    /// Appends whatever `message` contributes to the chat log. `name_of`
    /// resolves display names of known participants.
    pub fn on_receive<F>(&mut self, message: &SignalingMessage, name_of: F) -> Option<ChatMessage>
    where
        F: Fn(&ParticipantId) -> Option<String>,
    {
        let entry = match message {
            SignalingMessage::Chat {
                content, sender, ..
            } => {
                self.unread += 1;
                ChatMessage::user(sender.as_deref().unwrap_or(UNKNOWN_SENDER), content.as_str())
            }
            SignalingMessage::UserJoined { username, .. } => {
                ChatMessage::system(format!("{username} joined the meeting"))
            }
            SignalingMessage::UserLeft {
                client_id,
                username,
            } => {
                let name = username
                    .clone()
                    .or_else(|| name_of(client_id))
                    .unwrap_or_else(|| client_id.to_string());
                ChatMessage::system(format!("{name} left the meeting"))
            }
            _ => return None,
        };

        Some(self.push(entry))
    }

    /// Appends a local notice. Never sent and never counted as unread.
    pub fn system(&mut self, text: impl Into<String>) -> ChatMessage {
        self.push(ChatMessage::system(text))
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Inbound user messages since the last [`Self::mark_read`].
    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn mark_read(&mut self) {
        self.unread = 0;
    }

    fn push(&mut self, message: ChatMessage) -> ChatMessage {
        self.history.push(message.clone());
        message
    }
}
