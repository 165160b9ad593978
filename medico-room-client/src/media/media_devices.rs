use async_trait::async_trait;
use medico_room_core::MediaKind;
use serde::Serialize;

use crate::error::MediaError;
use crate::media::local_track::LocalTrack;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub label: String,
    pub kind: MediaKind,
}

/// Capture backend: the platform side of camera, microphone and display
/// capture.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, MediaError>;

    /// Opens a camera or microphone. `None` picks the default device.
    async fn user_media(
        &self,
        kind: MediaKind,
        device_id: Option<&str>,
    ) -> Result<LocalTrack, MediaError>;

    async fn display_media(&self) -> Result<LocalTrack, MediaError>;
}
