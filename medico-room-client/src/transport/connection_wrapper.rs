use anyhow::{Result, bail};
use async_trait::async_trait;
use medico_room_core::{IceCandidate, IceServerConfig, MediaKind, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::API;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::media::LocalTrack;
use crate::transport::peer_connection::{PeerConnection, PeerConnectionFactory};
use crate::transport::transport_event::{
    PeerConnectionState, PeerKey, RemoteTrack, RtpSource, TransportEvent,
};

/// Builds webrtc-rs peer connections that share one media engine.
pub struct RtcPeerFactory {
    api: API,
}

impl RtcPeerFactory {
    pub fn new() -> Result<Self> {
        // 1. Codecs: Opus for audio, VP8/VP9/H264 for video
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        // 2. Interceptors (NACK, RTCP reports)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self { api })
    }
}

#[async_trait]
impl PeerConnectionFactory for RtcPeerFactory {
    async fn create(
        &self,
        key: PeerKey,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerConnection>> {
        let wrapper = ConnectionWrapper::new(&self.api, key, ice_servers, events).await?;
        Ok(Box::new(wrapper))
    }
}

pub struct ConnectionWrapper {
    pub key: PeerKey,
    pub peer_connection: Arc<RTCPeerConnection>,
    audio: Arc<RTCRtpTransceiver>,
    video: Arc<RTCRtpTransceiver>,
}

impl ConnectionWrapper {
    /// Opens a connection to `key.participant`. Everything the connection
    /// reports afterwards goes to `event_tx` tagged with `key`.
    pub async fn new(
        api: &API,
        key: PeerKey,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        // 1. ICE servers (STUN/TURN) from the room config
        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        // 2. The connection itself
        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // 3. Both senders exist before the first offer; tracks are swapped in later.
        let audio = peer_connection
            .add_transceiver_from_kind(RTPCodecType::Audio, None)
            .await?;
        let video = peer_connection
            .add_transceiver_from_kind(RTPCodecType::Video, None)
            .await?;

        // --- Callbacks ---
        // Each closure owns its own sender and key clone.

        // A. Connection state. Unspecified is webrtc-internal and never reported.
        let state_tx = event_tx.clone();
        let key_state = key.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let key = key_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {}", key, s);
                    let state = match s {
                        RTCPeerConnectionState::New => PeerConnectionState::New,
                        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
                        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
                        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
                        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
                        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
                        RTCPeerConnectionState::Unspecified => return,
                    };
                    let _ = tx.send(TransportEvent::StateChanged(key, state)).await;
                })
            },
        ));

        // B. Trickle ICE: local candidates go out through signaling.
        // `None` marks the end of gathering and is not relayed.
        let ice_tx = event_tx.clone();
        let key_ice = key.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let key = key_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(key, candidate))
                    .await;
            })
        }));

        // C. Incoming media. The raw track rides along for playback and recording.
        let track_tx = event_tx;
        let key_track = key.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let key = key_track.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        RTPCodecType::Video => MediaKind::Video,
                        RTPCodecType::Unspecified => return,
                    };
                    debug!("Remote {} track from {}", kind, key);
                    let remote = RemoteTrack {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind,
                        rtp: Some(track as Arc<dyn RtpSource>),
                    };
                    let _ = tx.send(TransportEvent::RemoteTrack(key, remote)).await;
                })
            },
        ));

        Ok(Self {
            key,
            peer_connection,
            audio,
            video,
        })
    }

    fn transceiver(&self, kind: MediaKind) -> &Arc<RTCRtpTransceiver> {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }
}

#[async_trait]
impl PeerConnection for ConnectionWrapper {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
            SdpKind::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
            SdpKind::Rollback => bail!("remote rollback descriptions are not supported"),
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn replace_track(&self, kind: MediaKind, track: Option<&LocalTrack>) -> Result<()> {
        let sender = self.transceiver(kind).sender().await;
        let track = track.map(|t| t.rtc_track() as Arc<dyn TrackLocal + Send + Sync>);
        sender.replace_track(track).await?;
        Ok(())
    }

    async fn sender_track_id(&self, kind: MediaKind) -> Option<String> {
        let sender = self.transceiver(kind).sender().await;
        sender.track().await.map(|t| t.id().to_owned())
    }

    /// Also fires the state callback with `Closed`.
    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
