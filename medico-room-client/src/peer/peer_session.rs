use medico_room_core::{IceCandidate, MediaKind, ParticipantId, SessionDescription};
use tracing::{debug, warn};

use crate::error::NegotiationError;
use crate::media::LocalSession;
use crate::transport::PeerConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    Offering,
    Answering,
    Connected,
    Closed,
}

/// Offer/answer/ICE negotiation with a single remote participant.
///
/// Remote candidates that arrive before a remote description is applied are
/// queued and replayed once it is.
pub struct PeerSession {
    remote: ParticipantId,
    connection: Box<dyn PeerConnection>,
    state: NegotiationState,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
}

impl PeerSession {
    pub fn new(remote: ParticipantId, connection: Box<dyn PeerConnection>) -> Self {
        Self {
            remote,
            connection,
            state: NegotiationState::New,
            remote_description_set: false,
            pending_candidates: Vec::new(),
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn connection(&self) -> &dyn PeerConnection {
        self.connection.as_ref()
    }

    pub fn queued_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Puts the current local tracks on the connection's senders.
    pub async fn attach(&self, local: &LocalSession) -> Result<(), NegotiationError> {
        for kind in [MediaKind::Audio, MediaKind::Video] {
            self.connection
                .replace_track(kind, local.outgoing(kind))
                .await?;
        }
        Ok(())
    }

    /// `New -> Offering`: attaches local media and returns the offer to send.
    pub async fn start_offer(
        &mut self,
        local: &LocalSession,
    ) -> Result<SessionDescription, NegotiationError> {
        self.require(&[NegotiationState::New], "create an offer")?;

        self.attach(local).await?;
        let offer = self.connection.create_offer().await?;
        self.state = NegotiationState::Offering;
        Ok(offer)
    }

    /// Answers a remote offer. Also accepted on a connected session, which
    /// renegotiates. Returns the answer to send.
    pub async fn accept_offer(
        &mut self,
        offer: SessionDescription,
        local: &LocalSession,
    ) -> Result<SessionDescription, NegotiationError> {
        self.require(
            &[
                NegotiationState::New,
                NegotiationState::Offering,
                NegotiationState::Connected,
            ],
            "answer an offer",
        )?;

        if self.state == NegotiationState::New {
            self.attach(local).await?;
        }
        self.state = NegotiationState::Answering;

        self.connection.set_remote_description(offer).await?;
        self.remote_description_set = true;
        self.flush_candidates().await;

        let answer = self.connection.create_answer().await?;
        self.state = NegotiationState::Connected;
        Ok(answer)
    }

    /// `Offering -> Connected`.
    pub async fn accept_answer(
        &mut self,
        answer: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.require(&[NegotiationState::Offering], "apply an answer")?;

        self.connection.set_remote_description(answer).await?;
        self.remote_description_set = true;
        self.flush_candidates().await;
        self.state = NegotiationState::Connected;
        Ok(())
    }

    pub async fn add_remote_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        if self.state == NegotiationState::Closed {
            debug!("Dropping candidate for closed session {}", self.remote);
            return Ok(());
        }
        if !self.remote_description_set {
            self.pending_candidates.push(candidate);
            return Ok(());
        }
        self.connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    /// Releases the connection and every queued candidate. Idempotent.
    pub async fn close(&mut self) {
        if self.state == NegotiationState::Closed {
            return;
        }
        self.state = NegotiationState::Closed;
        self.pending_candidates.clear();

        if let Err(e) = self.connection.close().await {
            warn!("Failed to close connection to {}: {:#}", self.remote, e);
        }
    }

    async fn flush_candidates(&mut self) {
        let queued = std::mem::take(&mut self.pending_candidates);
        if !queued.is_empty() {
            debug!("Replaying {} queued candidate(s) for {}", queued.len(), self.remote);
        }
        for candidate in queued {
            if let Err(e) = self.connection.add_ice_candidate(candidate).await {
                warn!("Queued candidate for {} rejected: {:#}", self.remote, e);
            }
        }
    }

    fn require(
        &self,
        allowed: &[NegotiationState],
        action: &'static str,
    ) -> Result<(), NegotiationError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(NegotiationError::InvalidState {
                action,
                state: self.state,
            })
        }
    }
}
