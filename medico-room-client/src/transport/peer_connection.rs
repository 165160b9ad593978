use anyhow::Result;
use async_trait::async_trait;
use medico_room_core::{IceCandidate, IceServerConfig, MediaKind, SessionDescription};
use tokio::sync::mpsc;

use crate::media::LocalTrack;
use crate::transport::transport_event::{PeerKey, TransportEvent};

/// One peer connection to one remote participant.
///
/// Every connection carries exactly one audio and one video sender from the
/// start, so changing what is sent never needs a new offer.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Creates an offer and applies it as the local description.
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Creates an answer and applies it as the local description.
    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Swaps the track on the `kind` sender in place; `None` sends nothing.
    async fn replace_track(&self, kind: MediaKind, track: Option<&LocalTrack>) -> Result<()>;

    /// Id of the local track currently on the `kind` sender.
    async fn sender_track_id(&self, kind: MediaKind) -> Option<String>;

    async fn close(&self) -> Result<()>;
}

/// Creates peer connections. Callbacks of the new connection are posted to
/// `events` tagged with `key`.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    async fn create(
        &self,
        key: PeerKey,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerConnection>>;
}
