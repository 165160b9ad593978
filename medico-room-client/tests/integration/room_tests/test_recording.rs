use medico_room_client::{RecordingError, RoomError, RoomEvent};
use medico_room_core::{ChatKind, MediaKind};
use std::fs;

use crate::integration::{create_test_room_with, init_tracing, test_config};
use crate::utils::{MockDevices, MockRtpSource, wait_for_event};

fn is_notice(event: &RoomEvent, text: &str) -> bool {
    matches!(event, RoomEvent::Chat(m) if m.kind == ChatKind::System && m.content == text)
}

fn is_track(event: &RoomEvent, kind: MediaKind) -> bool {
    matches!(event, RoomEvent::RemoteTrack { track, .. } if track.kind == kind)
}

#[tokio::test]
async fn test_recording_captures_remote_tracks() {
    init_tracing();

    let base = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.recording_dir = base.path().to_owned();
    let mut room = create_test_room_with(config, MockDevices::new(), &[("200", "Asha")]).await;
    let asha = room.peers.peer("200").unwrap();

    // Audio was already flowing before the recording started.
    let (audio, mut audio_feed) = MockRtpSource::new("audio/opus");
    asha.receive_track(MediaKind::Audio, audio).await;
    wait_for_event(&mut room.events, |e| is_track(e, MediaKind::Audio))
        .await
        .unwrap();

    let dir = room.handle.start_recording().await.unwrap();
    assert!(dir.starts_with(base.path()));
    wait_for_event(&mut room.events, |e| is_notice(e, "Recording started"))
        .await
        .unwrap();
    assert!(room.handle.snapshot().await.unwrap().recording);

    // Video shows up mid-recording.
    let (video, mut video_feed) = MockRtpSource::new("video/VP8");
    asha.receive_track(MediaKind::Video, video).await;
    wait_for_event(&mut room.events, |e| is_track(e, MediaKind::Video))
        .await
        .unwrap();

    for _ in 0..3 {
        audio_feed.opus_frame();
        video_feed.vp8_key_frame();
    }

    let recording = room.handle.stop_recording().await.unwrap();
    wait_for_event(&mut room.events, |e| is_notice(e, "Recording stopped"))
        .await
        .unwrap();

    assert_eq!(recording.dir, dir);
    assert_eq!(recording.skipped, 0);
    assert_eq!(recording.tracks.len(), 2);
    assert!(recording.tracks.iter().all(|t| t.participant.as_str() == "200"));

    let audio = recording
        .tracks
        .iter()
        .find(|t| t.kind == MediaKind::Audio)
        .unwrap();
    assert_eq!(audio.packets, 3);
    assert_eq!(audio.path.extension().unwrap(), "ogg");
    assert!(fs::read(&audio.path).unwrap().starts_with(b"OggS"));

    let video = recording
        .tracks
        .iter()
        .find(|t| t.kind == MediaKind::Video)
        .unwrap();
    assert_eq!(video.packets, 3);
    let ivf = fs::read(&video.path).unwrap();
    assert!(ivf.starts_with(b"DKIF"));
    assert_eq!(&ivf[24..28], &3u32.to_le_bytes());

    let snapshot = room.handle.snapshot().await.unwrap();
    assert!(!snapshot.recording);
    let notices: Vec<_> = snapshot
        .chat
        .iter()
        .filter(|m| m.kind == ChatKind::System)
        .map(|m| m.content.as_str())
        .collect();
    assert!(notices.ends_with(&["Recording started", "Recording stopped"]));
}

#[tokio::test]
async fn test_recording_start_and_stop_are_checked() {
    init_tracing();

    let base = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.recording_dir = base.path().to_owned();
    let room = create_test_room_with(config, MockDevices::new(), &[]).await;

    assert!(matches!(
        room.handle.stop_recording().await,
        Err(RoomError::Recording(RecordingError::NotRecording))
    ));

    room.handle.start_recording().await.unwrap();
    assert!(matches!(
        room.handle.start_recording().await,
        Err(RoomError::Recording(RecordingError::AlreadyRecording))
    ));

    let recording = room.handle.stop_recording().await.unwrap();
    assert!(recording.tracks.is_empty());
    assert!(recording.dir.is_dir());
}

#[tokio::test]
async fn test_leave_finishes_running_recording() {
    init_tracing();

    let base = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.recording_dir = base.path().to_owned();
    let mut room = create_test_room_with(config, MockDevices::new(), &[("200", "Asha")]).await;

    let dir = room.handle.start_recording().await.unwrap();
    let (audio, mut feed) = MockRtpSource::new("audio/opus");
    room.peers
        .peer("200")
        .unwrap()
        .receive_track(MediaKind::Audio, audio)
        .await;
    wait_for_event(&mut room.events, |e| is_track(e, MediaKind::Audio))
        .await
        .unwrap();
    feed.opus_frame();

    room.handle.leave().await.unwrap();

    let files: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(fs::read(&files[0]).unwrap().starts_with(b"OggS"));
}
