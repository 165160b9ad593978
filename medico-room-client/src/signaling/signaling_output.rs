use medico_room_core::{IceCandidate, MediaState, ParticipantId, SessionDescription, SignalingMessage};

/// Outbound side of the signaling channel as seen by the room and the chat.
///
/// Sending is fire and forget: when the channel is not open the frame is
/// logged and dropped, so callers must never rely on delivery.
pub trait SignalingOutput: Send + Sync {
    fn send(&self, message: SignalingMessage);

    fn send_offer(&self, to: &ParticipantId, from: &ParticipantId, offer: SessionDescription) {
        self.send(SignalingMessage::Offer {
            offer,
            to_client: to.clone(),
            from: Some(from.clone()),
        });
    }

    fn send_answer(&self, to: &ParticipantId, from: &ParticipantId, answer: SessionDescription) {
        self.send(SignalingMessage::Answer {
            answer,
            to_client: to.clone(),
            from: Some(from.clone()),
        });
    }

    fn send_ice(&self, to: &ParticipantId, from: &ParticipantId, candidate: IceCandidate) {
        self.send(SignalingMessage::IceCandidate {
            candidate,
            to_client: to.clone(),
            from: Some(from.clone()),
        });
    }

    fn send_chat(&self, content: String) {
        self.send(SignalingMessage::Chat {
            content,
            sender: None,
            timestamp: None,
        });
    }

    fn send_media_state(&self, client_id: &ParticipantId, state: MediaState) {
        self.send(SignalingMessage::MediaStateUpdate {
            client_id: client_id.clone(),
            audio_enabled: state.audio_enabled,
            video_enabled: state.video_enabled,
            screen_sharing: state.screen_sharing,
        });
    }
}
