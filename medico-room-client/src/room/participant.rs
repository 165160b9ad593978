use medico_room_core::{ChatMessage, MediaState, ParticipantId};

use crate::peer::{NegotiationState, PeerSession};
use crate::transport::{PeerConnectionState, RemoteTrack};

/// A remote participant and the session that owns its peer connection.
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub media: MediaState,
    pub session: PeerSession,
    /// Generation of the connection inside `session`.
    pub generation: u64,
    pub connection_state: PeerConnectionState,
    /// Latest remote track per kind.
    pub tracks: Vec<RemoteTrack>,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        name: String,
        media: MediaState,
        session: PeerSession,
        generation: u64,
    ) -> Self {
        Self {
            id,
            name,
            media,
            session,
            generation,
            connection_state: PeerConnectionState::New,
            tracks: Vec::new(),
        }
    }

    pub fn set_track(&mut self, track: RemoteTrack) {
        self.tracks.retain(|t| t.kind != track.kind);
        self.tracks.push(track);
    }

    pub fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            media: self.media,
            negotiation: self.session.state(),
            connection: self.connection_state,
            tracks: self.tracks.clone(),
        }
    }
}

/// Read-only copy of a [`Participant`] handed to the UI layer.
#[derive(Debug, Clone)]
pub struct ParticipantSnapshot {
    pub id: ParticipantId,
    pub name: String,
    pub media: MediaState,
    pub negotiation: NegotiationState,
    pub connection: PeerConnectionState,
    pub tracks: Vec<RemoteTrack>,
}

#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub local_id: ParticipantId,
    pub signaling_connected: bool,
    pub local_media: MediaState,
    pub participants: Vec<ParticipantSnapshot>,
    pub chat: Vec<ChatMessage>,
    pub unread: usize,
    pub recording: bool,
}
