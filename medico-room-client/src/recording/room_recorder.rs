use chrono::{DateTime, Utc};
use medico_room_core::{MediaKind, ParticipantId};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::RecordingError;
use crate::recording::track_recorder::{Container, TrackRecorder};
use crate::transport::RemoteTrack;

/// A running room recording.
///
/// Every remote track handed to [`RoomRecorder::add_track`] is copied into
/// its own file under a fresh `conference-<time>` directory: Opus audio as
/// Ogg, VP8/VP9 video as IVF. Tracks without a packet source or with any
/// other codec are skipped.
pub struct RoomRecorder {
    dir: PathBuf,
    started_at: DateTime<Utc>,
    tracks: Vec<TrackRecorder>,
    skipped: usize,
}

/// A finished recording.
#[derive(Debug, Clone)]
pub struct Recording {
    pub dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub tracks: Vec<RecordedTrack>,
    /// Tracks that could not be recorded.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct RecordedTrack {
    pub participant: ParticipantId,
    pub kind: MediaKind,
    pub path: PathBuf,
    pub packets: u64,
}

impl RoomRecorder {
    pub async fn start(base: &Path) -> Result<Self, RecordingError> {
        let started_at = Utc::now();
        let dir = base.join(format!("conference-{}", started_at.format("%Y%m%d-%H%M%S%.3f")));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| RecordingError::Io {
                path: dir.clone(),
                source,
            })?;

        info!("Recording to {}", dir.display());
        Ok(Self {
            dir,
            started_at,
            tracks: Vec::new(),
            skipped: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Starts copying `track`. A track that is already being recorded is
    /// left alone.
    pub fn add_track(&mut self, participant: &ParticipantId, track: &RemoteTrack) {
        if self
            .tracks
            .iter()
            .any(|t| t.participant == *participant && t.track_id == track.id)
        {
            return;
        }

        let Some(source) = &track.rtp else {
            debug!("{} track of {} has no packet source", track.kind, participant);
            self.skipped += 1;
            return;
        };

        let container = match Container::for_mime(&source.mime_type()) {
            Ok(container) => container,
            Err(e) => {
                warn!("Not recording {} track of {}: {}", track.kind, participant, e);
                self.skipped += 1;
                return;
            }
        };

        let path = self.dir.join(format!(
            "{}-{}-{}.{}",
            file_stem(participant),
            track.kind,
            self.tracks.len() + 1,
            container.extension()
        ));
        match TrackRecorder::spawn(
            participant.clone(),
            track.kind,
            track.id.clone(),
            path,
            container,
            source.clone(),
        ) {
            Ok(recorder) => {
                debug!(
                    "Recording {} track of {} to {}",
                    track.kind,
                    participant,
                    recorder.path.display()
                );
                self.tracks.push(recorder);
            }
            Err(e) => {
                warn!("Failed to record {} track of {}: {}", track.kind, participant, e);
                self.skipped += 1;
            }
        }
    }

    /// Stops every track copy and closes the files.
    pub async fn stop(self) -> Recording {
        let mut tracks = Vec::with_capacity(self.tracks.len());
        for recorder in self.tracks {
            let (participant, kind, path, packets) = recorder.stop().await;
            tracks.push(RecordedTrack {
                participant,
                kind,
                path,
                packets,
            });
        }

        info!(
            "Recording in {} finished with {} track(s)",
            self.dir.display(),
            tracks.len()
        );
        Recording {
            dir: self.dir,
            started_at: self.started_at,
            stopped_at: Utc::now(),
            tracks,
            skipped: self.skipped,
        }
    }
}

/// Client ids come from the server; keep file names tame.
fn file_stem(id: &ParticipantId) -> String {
    id.as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
