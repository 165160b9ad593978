use async_trait::async_trait;
use medico_room_client::{DeviceInfo, LocalTrack, MediaDevices, MediaError, SyntheticDevices};
use medico_room_core::MediaKind;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What a [`MockDevices`] call is about.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Capture {
    User(MediaKind),
    Display,
}

/// Synthetic devices with a second camera, one-shot failure injection and a
/// record of every track handed out.
pub struct MockDevices {
    inner: SyntheticDevices,
    failures: Mutex<HashMap<Capture, MediaError>>,
    opened: Mutex<Vec<LocalTrack>>,
}

impl MockDevices {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SyntheticDevices::new()
                .with_device(MediaKind::Video, "usb-cam", "USB camera")
                .with_device(MediaKind::Audio, "headset-mic", "Headset microphone"),
            failures: Mutex::new(HashMap::new()),
            opened: Mutex::new(Vec::new()),
        })
    }

    /// The next `capture` request fails with `error`.
    pub fn fail_next(&self, capture: Capture, error: MediaError) {
        self.failures.lock().unwrap().insert(capture, error);
    }

    pub fn opened(&self) -> Vec<LocalTrack> {
        self.opened.lock().unwrap().clone()
    }

    pub fn opened_count(&self, kind: MediaKind) -> usize {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.kind() == kind)
            .count()
    }

    /// Most recent display capture, used to simulate the platform ending it.
    pub fn last_screen(&self) -> Option<LocalTrack> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|t| t.device_id() == "screen")
            .cloned()
    }

    fn take_failure(&self, capture: Capture) -> Result<(), MediaError> {
        match self.failures.lock().unwrap().remove(&capture) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn record(&self, track: LocalTrack) -> LocalTrack {
        self.opened.lock().unwrap().push(track.clone());
        track
    }
}

#[async_trait]
impl MediaDevices for MockDevices {
    async fn enumerate(&self) -> Result<Vec<DeviceInfo>, MediaError> {
        self.inner.enumerate().await
    }

    async fn user_media(
        &self,
        kind: MediaKind,
        device_id: Option<&str>,
    ) -> Result<LocalTrack, MediaError> {
        self.take_failure(Capture::User(kind))?;
        let track = self.inner.user_media(kind, device_id).await?;
        Ok(self.record(track))
    }

    async fn display_media(&self) -> Result<LocalTrack, MediaError> {
        self.take_failure(Capture::Display)?;
        let track = self.inner.display_media().await?;
        Ok(self.record(track))
    }
}
