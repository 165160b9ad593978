use medico_room_core::{MediaKind, MediaState};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::MediaError;
use crate::media::local_session::LocalSession;
use crate::media::local_track::LocalTrack;
use crate::media::media_devices::{DeviceInfo, MediaDevices};
use crate::transport::PeerConnection;

/// Owns the local capture and keeps every peer sender in step with it.
///
/// Mute policy: turning a kind off only disables its track in place. The
/// track stays on every sender and is released when the room is left, so
/// unmuting is instant. A kind is acquired lazily the first time it is
/// enabled (for example after joining with the camera off).
///
/// Every operation that changes which track peers send goes through
/// [`substitute_track`], which applies the change to all given peers or to
/// none of them.
pub struct LocalMediaController {
    devices: Arc<dyn MediaDevices>,
    session: LocalSession,
}

impl LocalMediaController {
    pub fn new(devices: Arc<dyn MediaDevices>, audio_enabled: bool, video_enabled: bool) -> Self {
        Self {
            devices,
            session: LocalSession::new(audio_enabled, video_enabled),
        }
    }

    pub fn session(&self) -> &LocalSession {
        &self.session
    }

    pub fn state(&self) -> MediaState {
        self.session.state()
    }

    /// Acquires every kind that starts enabled. A kind that cannot be
    /// acquired is switched off and its error returned; the others proceed.
    pub async fn start(&mut self) -> Vec<MediaError> {
        let mut errors = Vec::new();

        for kind in [MediaKind::Audio, MediaKind::Video] {
            if !self.is_enabled(kind) || self.capture(kind).is_some() {
                continue;
            }
            match self.devices.user_media(kind, None).await {
                Ok(track) => *self.capture_mut(kind) = Some(track),
                Err(e) => {
                    warn!("Could not start {}: {}", kind, e);
                    self.set_flag(kind, false);
                    errors.push(e);
                }
            }
        }

        errors
    }

    pub async fn set_audio_enabled(
        &mut self,
        enabled: bool,
        peers: &[&dyn PeerConnection],
    ) -> Result<(), MediaError> {
        self.set_enabled(MediaKind::Audio, enabled, peers).await
    }

    pub async fn set_video_enabled(
        &mut self,
        enabled: bool,
        peers: &[&dyn PeerConnection],
    ) -> Result<(), MediaError> {
        self.set_enabled(MediaKind::Video, enabled, peers).await
    }

    async fn set_enabled(
        &mut self,
        kind: MediaKind,
        enabled: bool,
        peers: &[&dyn PeerConnection],
    ) -> Result<(), MediaError> {
        if let Some(track) = self.capture(kind) {
            track.set_enabled(enabled);
            self.set_flag(kind, enabled);
            return Ok(());
        }
        if !enabled {
            self.set_flag(kind, false);
            return Ok(());
        }

        let track = self.devices.user_media(kind, None).await?;
        if self.is_on_senders(kind) {
            if let Err(e) = substitute_track(peers, kind, Some(&track), None).await {
                track.stop();
                return Err(e);
            }
        }

        info!("Acquired {} track {}", kind, track.id());
        *self.capture_mut(kind) = Some(track);
        self.set_flag(kind, true);
        Ok(())
    }

    /// Switches the capture device of `kind`. The new track replaces the old
    /// one on every peer without renegotiation; on any failure the previous
    /// track stays in place everywhere.
    pub async fn set_device(
        &mut self,
        kind: MediaKind,
        device_id: &str,
        peers: &[&dyn PeerConnection],
    ) -> Result<(), MediaError> {
        let track = self.devices.user_media(kind, Some(device_id)).await?;
        track.set_enabled(self.is_enabled(kind));

        let previous = self.capture(kind).cloned();
        if self.is_on_senders(kind) {
            if let Err(e) = substitute_track(peers, kind, Some(&track), previous.as_ref()).await {
                track.stop();
                return Err(e);
            }
        }

        if let Some(previous) = previous {
            previous.stop();
        }
        info!("Switched {} to device {:?}", kind, track.label());
        *self.capture_mut(kind) = Some(track);
        Ok(())
    }

    pub async fn start_screen_share(
        &mut self,
        peers: &[&dyn PeerConnection],
    ) -> Result<(), MediaError> {
        if self.session.screen.is_some() {
            return Ok(());
        }

        let screen = self.devices.display_media().await?;
        let camera = self.session.camera.clone();
        if let Err(e) =
            substitute_track(peers, MediaKind::Video, Some(&screen), camera.as_ref()).await
        {
            screen.stop();
            return Err(e);
        }

        info!("Screen share started");
        self.session.screen = Some(screen);
        Ok(())
    }

    /// Puts the camera back on every video sender, opening it first if it
    /// was never acquired. Also the fallback after the platform ended the
    /// share on its own.
    pub async fn stop_screen_share(
        &mut self,
        peers: &[&dyn PeerConnection],
    ) -> Result<(), MediaError> {
        let Some(screen) = self.session.screen.clone() else {
            return Ok(());
        };

        if self.session.camera.is_none() && self.session.video_enabled {
            match self.devices.user_media(MediaKind::Video, None).await {
                Ok(camera) => self.session.camera = Some(camera),
                Err(e) => warn!("No camera to restore after screen share: {}", e),
            }
        }

        let camera = self.session.camera.clone();
        let result =
            substitute_track(peers, MediaKind::Video, camera.as_ref(), Some(&screen)).await;

        // A dead capture cannot stay in the session even if peers kept it.
        if result.is_ok() || screen.is_ended() {
            self.session.screen = None;
            screen.stop();
            info!("Screen share stopped");
        }
        result
    }

    /// Resolves once the running screen share is ended by the platform.
    /// Pending forever when nothing is being shared.
    pub fn screen_share_ended(&self) -> impl Future<Output = ()> + Send + 'static {
        let screen = self.session.screen.clone();
        async move {
            match screen {
                Some(screen) => screen.ended().await,
                None => std::future::pending().await,
            }
        }
    }

    pub async fn devices(&self) -> Result<Vec<DeviceInfo>, MediaError> {
        self.devices.enumerate().await
    }

    /// Releases all capture.
    pub fn stop_all(&mut self) {
        for track in [
            self.session.microphone.take(),
            self.session.camera.take(),
            self.session.screen.take(),
        ]
        .into_iter()
        .flatten()
        {
            track.stop();
        }
    }

    fn is_enabled(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Audio => self.session.audio_enabled,
            MediaKind::Video => self.session.video_enabled,
        }
    }

    fn set_flag(&mut self, kind: MediaKind, enabled: bool) {
        match kind {
            MediaKind::Audio => self.session.audio_enabled = enabled,
            MediaKind::Video => self.session.video_enabled = enabled,
        }
    }

    fn capture(&self, kind: MediaKind) -> Option<&LocalTrack> {
        match kind {
            MediaKind::Audio => self.session.microphone.as_ref(),
            MediaKind::Video => self.session.camera.as_ref(),
        }
    }

    fn capture_mut(&mut self, kind: MediaKind) -> &mut Option<LocalTrack> {
        match kind {
            MediaKind::Audio => &mut self.session.microphone,
            MediaKind::Video => &mut self.session.camera,
        }
    }

    /// Camera frames are off the senders while a screen share runs.
    fn is_on_senders(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Audio || self.session.screen.is_none()
    }
}

/// Replaces the `kind` sender track on every peer. If any peer refuses, the
/// peers already switched are rolled back to `previous` before returning.
pub async fn substitute_track(
    peers: &[&dyn PeerConnection],
    kind: MediaKind,
    next: Option<&LocalTrack>,
    previous: Option<&LocalTrack>,
) -> Result<(), MediaError> {
    for (switched, peer) in peers.iter().enumerate() {
        let Err(e) = peer.replace_track(kind, next).await else {
            continue;
        };

        warn!("Track switch failed, rolling back {} peer(s): {:#}", switched, e);
        for done in &peers[..switched] {
            if let Err(e) = done.replace_track(kind, previous).await {
                warn!("Rollback of {} sender failed: {:#}", kind, e);
            }
        }
        return Err(MediaError::Substitution {
            kind,
            reason: e.to_string(),
        });
    }
    Ok(())
}
