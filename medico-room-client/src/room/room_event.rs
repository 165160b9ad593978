use medico_room_core::{ChatMessage, MediaState, ParticipantId};

use crate::error::MediaError;
use crate::room::participant::ParticipantSnapshot;
use crate::transport::{PeerConnectionState, RemoteTrack};

/// Everything the UI layer needs to re-render the room.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Signaling went up or down. Peer media keeps flowing either way.
    SignalingConnected(bool),

    ParticipantJoined(ParticipantSnapshot),

    ParticipantLeft { id: ParticipantId, name: String },

    ParticipantMediaChanged { id: ParticipantId, media: MediaState },

    PeerConnectionChanged {
        id: ParticipantId,
        state: PeerConnectionState,
    },

    RemoteTrack { id: ParticipantId, track: RemoteTrack },

    LocalMediaChanged(MediaState),

    /// A capture problem the user should act on.
    MediaError(MediaError),

    Chat(ChatMessage),

    /// Terminal; no events follow.
    Left,
}
