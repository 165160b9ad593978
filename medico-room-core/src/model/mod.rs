mod chat;
mod media;
mod participant;
mod room;
mod signaling;

pub use chat::{ChatKind, ChatMessage};
pub use media::{MediaKind, MediaState};
pub use participant::{Identity, ParticipantId};
pub use room::{JoinCode, RoomAddress, RoomAddressError};
pub use signaling::{
    IceCandidate, IceServerConfig, RosterEntry, SdpKind, SessionDescription, SignalingMessage,
    WebRtcConfig,
};
