use medico_room_core::{ChatMessage, MediaKind, MediaState};
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

use crate::error::RoomError;
use crate::media::DeviceInfo;
use crate::recording::Recording;
use crate::room::participant::RoomSnapshot;
use crate::room::room_command::RoomCommand;

/// UI-side handle of a joined room. Every call fails with
/// [`RoomError::Closed`] once the room has been left.
#[derive(Clone)]
pub struct RoomHandle {
    command_tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<RoomCommand>) -> Self {
        Self { command_tx }
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<MediaState, RoomError> {
        Ok(self
            .request(|reply| RoomCommand::SetAudioEnabled { enabled, reply })
            .await??)
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<MediaState, RoomError> {
        Ok(self
            .request(|reply| RoomCommand::SetVideoEnabled { enabled, reply })
            .await??)
    }

    pub async fn set_device(
        &self,
        kind: MediaKind,
        device_id: impl Into<String>,
    ) -> Result<MediaState, RoomError> {
        let device_id = device_id.into();
        Ok(self
            .request(|reply| RoomCommand::SetDevice {
                kind,
                device_id,
                reply,
            })
            .await??)
    }

    pub async fn start_screen_share(&self) -> Result<MediaState, RoomError> {
        Ok(self
            .request(|reply| RoomCommand::StartScreenShare { reply })
            .await??)
    }

    pub async fn stop_screen_share(&self) -> Result<MediaState, RoomError> {
        Ok(self
            .request(|reply| RoomCommand::StopScreenShare { reply })
            .await??)
    }

    pub async fn devices(&self) -> Result<Vec<DeviceInfo>, RoomError> {
        Ok(self
            .request(|reply| RoomCommand::ListDevices { reply })
            .await??)
    }

    /// Returns the local copy, or `None` for blank text.
    pub async fn send_chat(&self, text: impl Into<String>) -> Result<Option<ChatMessage>, RoomError> {
        let text = text.into();
        self.request(|reply| RoomCommand::SendChat { text, reply })
            .await
    }

    pub async fn mark_chat_read(&self) -> Result<(), RoomError> {
        self.command_tx
            .send(RoomCommand::MarkChatRead)
            .await
            .map_err(|_| RoomError::Closed)
    }

    /// Records every remote track until [`Self::stop_recording`], including
    /// tracks that arrive later. Returns the directory the files go to.
    pub async fn start_recording(&self) -> Result<PathBuf, RoomError> {
        Ok(self
            .request(|reply| RoomCommand::StartRecording { reply })
            .await??)
    }

    pub async fn stop_recording(&self) -> Result<Recording, RoomError> {
        Ok(self
            .request(|reply| RoomCommand::StopRecording { reply })
            .await??)
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    /// Stops local media, closes signaling and every peer connection.
    pub async fn leave(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave { reply }).await
    }

    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| RoomError::Closed)?;
        response.await.map_err(|_| RoomError::Closed)
    }
}
