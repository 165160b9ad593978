use medico_room_core::{MediaKind, RoomAddressError};
use std::path::PathBuf;
use thiserror::Error;

use crate::peer::NegotiationState;

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("failed to connect to signaling server: {0}")]
    Connect(String),

    #[error("failed to send signaling frame: {0}")]
    Send(String),

    #[error("signaling connection broke: {0}")]
    Receive(String),

    #[error("invalid signaling address: {0}")]
    Address(#[from] RoomAddressError),

    #[error("failed to encode signaling frame: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("cannot {action} while negotiation is {state:?}")]
    InvalidState {
        action: &'static str,
        state: NegotiationState,
    },

    #[error(transparent)]
    Connection(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission to use the {0} was denied")]
    PermissionDenied(String),

    #[error("{0} is in use by another application")]
    DeviceBusy(String),

    #[error("no {kind} device with id {device_id:?}")]
    DeviceNotFound { kind: MediaKind, device_id: String },

    #[error("{0} capture is not supported here")]
    Unsupported(String),

    #[error("failed to switch {kind} track on a peer: {reason}")]
    Substitution { kind: MediaKind, reason: String },
}

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("a recording is already running")]
    AlreadyRecording,

    #[error("no recording is running")]
    NotRecording,

    #[error("no recorder for {0} tracks")]
    UnsupportedCodec(String),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Writer(#[from] webrtc::media::Error),
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error(transparent)]
    InvalidAddress(#[from] RoomAddressError),

    #[error("invalid signaling server url {url:?}: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error("the room session has ended")]
    Closed,
}
