use medico_room_core::{MediaKind, MediaState};

use crate::media::local_track::LocalTrack;

/// The local user's own media. Written only by [`crate::LocalMediaController`].
#[derive(Debug, Clone)]
pub struct LocalSession {
    pub microphone: Option<LocalTrack>,
    pub camera: Option<LocalTrack>,
    pub screen: Option<LocalTrack>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

impl LocalSession {
    pub fn new(audio_enabled: bool, video_enabled: bool) -> Self {
        Self {
            microphone: None,
            camera: None,
            screen: None,
            audio_enabled,
            video_enabled,
        }
    }

    /// Track peers should be sending for `kind`. A running screen share
    /// takes the video slot over the camera.
    pub fn outgoing(&self, kind: MediaKind) -> Option<&LocalTrack> {
        match kind {
            MediaKind::Audio => self.microphone.as_ref(),
            MediaKind::Video => self.screen.as_ref().or(self.camera.as_ref()),
        }
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen.is_some()
    }

    pub fn state(&self) -> MediaState {
        MediaState {
            audio_enabled: self.audio_enabled,
            video_enabled: self.video_enabled,
            screen_sharing: self.is_screen_sharing(),
        }
    }
}
