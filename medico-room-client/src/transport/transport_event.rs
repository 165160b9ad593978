use async_trait::async_trait;
use medico_room_core::{IceCandidate, MediaKind, ParticipantId};
use std::fmt;
use std::sync::Arc;
use webrtc::rtp::packet::Packet;
use webrtc::track::track_remote::TrackRemote;

/// Names one peer connection. A participant may be served by several
/// connections over its lifetime; each gets a new generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerKey {
    pub participant: ParticipantId,
    pub generation: u64,
}

impl PeerKey {
    pub fn new(participant: ParticipantId, generation: u64) -> Self {
        Self {
            participant,
            generation,
        }
    }
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.participant, self.generation)
    }
}

/// Connection state as the room cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Raw RTP of one incoming track.
#[async_trait]
pub trait RtpSource: Send + Sync {
    /// Negotiated codec, e.g. `audio/opus`.
    fn mime_type(&self) -> String;

    /// Next packet, or `None` once the track has ended. Must be cancel safe.
    async fn read_rtp(&self) -> Option<Packet>;
}

#[async_trait]
impl RtpSource for TrackRemote {
    fn mime_type(&self) -> String {
        self.codec().capability.mime_type
    }

    async fn read_rtp(&self) -> Option<Packet> {
        TrackRemote::read_rtp(self).await.ok().map(|(packet, _)| packet)
    }
}

/// Media arriving from a remote participant.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
    /// Packet source; absent for connections without a real network.
    pub rtp: Option<Arc<dyn RtpSource>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Events peer connections post back to the room loop, tagged with the
/// connection that produced them.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local ICE candidate that has to be relayed to the participant.
    CandidateGenerated(PeerKey, IceCandidate),

    /// The participant started sending a track.
    RemoteTrack(PeerKey, RemoteTrack),

    StateChanged(PeerKey, PeerConnectionState),
}

impl TransportEvent {
    pub fn key(&self) -> &PeerKey {
        match self {
            TransportEvent::CandidateGenerated(key, _)
            | TransportEvent::RemoteTrack(key, _)
            | TransportEvent::StateChanged(key, _) => key,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.key().participant
    }
}
