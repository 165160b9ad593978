use medico_room_core::{ChatMessage, MediaKind, MediaState};
use std::path::PathBuf;
use tokio::sync::oneshot;

use crate::error::{MediaError, RecordingError};
use crate::media::DeviceInfo;
use crate::recording::Recording;
use crate::room::participant::RoomSnapshot;

pub type MediaReply = oneshot::Sender<Result<MediaState, MediaError>>;

/// Requests from [`crate::RoomHandle`] to the room loop.
#[derive(Debug)]
pub enum RoomCommand {
    SetAudioEnabled { enabled: bool, reply: MediaReply },

    SetVideoEnabled { enabled: bool, reply: MediaReply },

    SetDevice {
        kind: MediaKind,
        device_id: String,
        reply: MediaReply,
    },

    StartScreenShare { reply: MediaReply },

    StopScreenShare { reply: MediaReply },

    ListDevices {
        reply: oneshot::Sender<Result<Vec<DeviceInfo>, MediaError>>,
    },

    SendChat {
        text: String,
        reply: oneshot::Sender<Option<ChatMessage>>,
    },

    MarkChatRead,

    StartRecording {
        reply: oneshot::Sender<Result<PathBuf, RecordingError>>,
    },

    StopRecording {
        reply: oneshot::Sender<Result<Recording, RecordingError>>,
    },

    Snapshot { reply: oneshot::Sender<RoomSnapshot> },

    /// Terminal: the loop exits after acknowledging.
    Leave { reply: oneshot::Sender<()> },
}
