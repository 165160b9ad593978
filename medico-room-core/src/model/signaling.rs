use crate::model::participant::ParticipantId;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    #[serde(deserialize_with = "one_or_many")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Browsers accept `urls` as a single string or a list; so do we.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRtcConfig {
    #[serde(rename = "iceServers", default)]
    pub ice_servers: Vec<IceServerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description in the `{type, sdp}` shape browsers exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", default)]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex", default)]
    pub sdp_m_line_index: Option<u16>,
    #[serde(
        rename = "usernameFragment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub username_fragment: Option<String>,
}

/// One row of the roster the server sends right after a client joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub client_id: ParticipantId,
    #[serde(default)]
    pub user_id: Option<String>,
    pub username: String,
    #[serde(rename = "isAudioEnabled", default)]
    pub audio_enabled: bool,
    #[serde(rename = "isVideoEnabled", default)]
    pub video_enabled: bool,
}

/// Typed frames of the room signaling channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingMessage {
    WebrtcConfig {
        config: WebRtcConfig,
    },
    ParticipantsList {
        participants: Vec<RosterEntry>,
    },
    UserJoined {
        client_id: ParticipantId,
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    UserLeft {
        client_id: ParticipantId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
    Offer {
        offer: SessionDescription,
        to_client: ParticipantId,
        #[serde(default)]
        from: Option<ParticipantId>,
    },
    Answer {
        answer: SessionDescription,
        to_client: ParticipantId,
        #[serde(default)]
        from: Option<ParticipantId>,
    },
    IceCandidate {
        candidate: IceCandidate,
        to_client: ParticipantId,
        #[serde(default)]
        from: Option<ParticipantId>,
    },
    Chat {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    MediaStateUpdate {
        client_id: ParticipantId,
        #[serde(rename = "isAudioEnabled")]
        audio_enabled: bool,
        #[serde(rename = "isVideoEnabled")]
        video_enabled: bool,
        #[serde(rename = "isScreenSharing", default)]
        screen_sharing: bool,
    },
    Ping,
    Pong,
    #[serde(other)]
    Unknown,
}

impl SignalingMessage {
    /// Peer a relayed frame is addressed to, if any.
    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            SignalingMessage::Offer { to_client, .. }
            | SignalingMessage::Answer { to_client, .. }
            | SignalingMessage::IceCandidate { to_client, .. } => Some(to_client),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignalingMessage::WebrtcConfig { .. } => "webrtc_config",
            SignalingMessage::ParticipantsList { .. } => "participants_list",
            SignalingMessage::UserJoined { .. } => "user_joined",
            SignalingMessage::UserLeft { .. } => "user_left",
            SignalingMessage::Offer { .. } => "offer",
            SignalingMessage::Answer { .. } => "answer",
            SignalingMessage::IceCandidate { .. } => "ice_candidate",
            SignalingMessage::Chat { .. } => "chat",
            SignalingMessage::MediaStateUpdate { .. } => "media_state_update",
            SignalingMessage::Ping => "ping",
            SignalingMessage::Pong => "pong",
            SignalingMessage::Unknown => "unknown",
        }
    }
}
