use async_trait::async_trait;
use bytes::Bytes;
use medico_room_core::MediaKind;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::MediaError;
use crate::media::local_track::{LocalTrack, TrackSource};
use crate::media::media_devices::{DeviceInfo, MediaDevices};

/// Opus frame that decodes to 20ms of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const OPUS_FRAME: Duration = Duration::from_millis(20);

/// Device backend without real hardware: a fixed device list, tracks that
/// carry no picture, and optionally a silent audio feed.
#[derive(Debug, Clone)]
pub struct SyntheticDevices {
    devices: Vec<DeviceInfo>,
    silence: bool,
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDevices {
    pub fn new() -> Self {
        Self {
            devices: vec![
                DeviceInfo {
                    device_id: "synthetic-mic".into(),
                    label: "Synthetic microphone".into(),
                    kind: MediaKind::Audio,
                },
                DeviceInfo {
                    device_id: "synthetic-camera".into(),
                    label: "Synthetic camera".into(),
                    kind: MediaKind::Video,
                },
            ],
            silence: false,
        }
    }

    pub fn with_device(mut self, kind: MediaKind, device_id: &str, label: &str) -> Self {
        self.devices.push(DeviceInfo {
            device_id: device_id.to_owned(),
            label: label.to_owned(),
            kind,
        });
        self
    }

    /// Microphone tracks stream Opus silence until stopped.
    pub fn with_silence(mut self) -> Self {
        self.silence = true;
        self
    }

    fn find(&self, kind: MediaKind, device_id: Option<&str>) -> Result<&DeviceInfo, MediaError> {
        self.devices
            .iter()
            .filter(|d| d.kind == kind)
            .find(|d| device_id.is_none_or(|id| d.device_id == id))
            .ok_or_else(|| MediaError::DeviceNotFound {
                kind,
                device_id: device_id.unwrap_or("default").to_owned(),
            })
    }
}

#[async_trait]
impl MediaDevices for SyntheticDevices {
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, MediaError> {
        Ok(self.devices.clone())
    }

    async fn user_media(
        &self,
        kind: MediaKind,
        device_id: Option<&str>,
    ) -> Result<LocalTrack, MediaError> {
        let device = self.find(kind, device_id)?;
        let source = match kind {
            MediaKind::Audio => TrackSource::Microphone,
            MediaKind::Video => TrackSource::Camera,
        };
        let track = LocalTrack::new(source, &device.device_id, &device.label);
        debug!("Opened {} on {}", track.id(), device.label);

        if self.silence && kind == MediaKind::Audio {
            tokio::spawn(feed_silence(track.clone()));
        }
        Ok(track)
    }

    async fn display_media(&self) -> Result<LocalTrack, MediaError> {
        Ok(LocalTrack::new(TrackSource::Screen, "screen", "Entire screen"))
    }
}

async fn feed_silence(track: LocalTrack) {
    let mut ticker = tokio::time::interval(OPUS_FRAME);
    loop {
        tokio::select! {
            _ = track.ended() => break,
            _ = ticker.tick() => {
                let frame = Bytes::from_static(&OPUS_SILENCE);
                if let Err(e) = track.write_sample(frame, OPUS_FRAME).await {
                    warn!("Silence feed for {} failed: {}", track.id(), e);
                    break;
                }
            }
        }
    }
}
