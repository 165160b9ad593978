use futures::FutureExt;
use medico_room_core::{MediaKind, ParticipantId};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MIME_TYPE_VP9};
use webrtc::media::io::Writer;
use webrtc::media::io::ivf_reader::IVFFileHeader;
use webrtc::media::io::ivf_writer::IVFWriter;
use webrtc::media::io::ogg_writer::OggWriter;
use webrtc::rtp::packet::Packet;

use crate::error::RecordingError;
use crate::transport::RtpSource;

const OPUS_SAMPLE_RATE: u32 = 48_000;
const OPUS_CHANNELS: u8 = 2;

type MediaWriter = Box<dyn Writer + Send>;

/// On-disk format for one codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Ogg,
    Ivf { four_cc: [u8; 4] },
}

impl Container {
    pub(crate) fn for_mime(mime_type: &str) -> Result<Self, RecordingError> {
        let mime = mime_type.to_lowercase();
        if mime == MIME_TYPE_OPUS.to_lowercase() {
            Ok(Container::Ogg)
        } else if mime == MIME_TYPE_VP8.to_lowercase() {
            Ok(Container::Ivf { four_cc: *b"VP80" })
        } else if mime == MIME_TYPE_VP9.to_lowercase() {
            Ok(Container::Ivf { four_cc: *b"VP90" })
        } else {
            Err(RecordingError::UnsupportedCodec(mime_type.to_owned()))
        }
    }

    pub(crate) fn extension(&self) -> &'static str {
        match self {
            Container::Ogg => "ogg",
            Container::Ivf { .. } => "ivf",
        }
    }

    fn open(&self, path: &Path) -> Result<MediaWriter, RecordingError> {
        let file = File::create(path).map_err(|source| RecordingError::Io {
            path: path.to_owned(),
            source,
        })?;

        let writer: MediaWriter = match *self {
            Container::Ogg => Box::new(OggWriter::new(file, OPUS_SAMPLE_RATE, OPUS_CHANNELS)?),
            Container::Ivf { four_cc } => {
                // Frame size and count are placeholders; the count is fixed on close.
                let header = IVFFileHeader {
                    signature: *b"DKIF",
                    version: 0,
                    header_size: 32,
                    four_cc,
                    width: 640,
                    height: 480,
                    timebase_denominator: 30,
                    timebase_numerator: 1,
                    num_frames: 0,
                    unused: 0,
                };
                Box::new(IVFWriter::new(file, &header)?)
            }
        };
        Ok(writer)
    }
}

/// Copies one incoming track into a file until stopped or the track ends.
pub(crate) struct TrackRecorder {
    pub participant: ParticipantId,
    pub kind: MediaKind,
    pub track_id: String,
    pub path: PathBuf,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<u64>,
}

impl TrackRecorder {
    pub(crate) fn spawn(
        participant: ParticipantId,
        kind: MediaKind,
        track_id: String,
        path: PathBuf,
        container: Container,
        source: Arc<dyn RtpSource>,
    ) -> Result<Self, RecordingError> {
        let mut writer = container.open(&path)?;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let label = path.display().to_string();

        let task = tokio::spawn(async move {
            let mut packets = 0;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        // Packets that already arrived still belong to the file.
                        while let Some(Some(packet)) = source.read_rtp().now_or_never() {
                            packets += write(&mut writer, &packet, &label);
                        }
                        break;
                    }

                    packet = source.read_rtp() => {
                        let Some(packet) = packet else {
                            debug!("Track recorded to {} ended", label);
                            break;
                        };
                        packets += write(&mut writer, &packet, &label);
                    }
                }
            }

            if let Err(e) = writer.close() {
                warn!("Failed to finalize {}: {}", label, e);
            }
            packets
        });

        Ok(Self {
            participant,
            kind,
            track_id,
            path,
            stop_tx,
            task,
        })
    }

    /// Stops copying and returns the number of packets written.
    pub(crate) async fn stop(self) -> (ParticipantId, MediaKind, PathBuf, u64) {
        let _ = self.stop_tx.send(());
        let packets = match self.task.await {
            Ok(packets) => packets,
            Err(e) => {
                warn!("Recorder for {} crashed: {}", self.path.display(), e);
                0
            }
        };
        (self.participant, self.kind, self.path, packets)
    }
}

fn write(writer: &mut MediaWriter, packet: &Packet, label: &str) -> u64 {
    match writer.write_rtp(packet) {
        Ok(()) => 1,
        Err(e) => {
            debug!("Skipping RTP packet for {}: {}", label, e);
            0
        }
    }
}
