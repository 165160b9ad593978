use medico_room_client::{NegotiationState, PeerConnectionState, RoomEvent};
use medico_room_core::{SessionDescription, SignalingMessage};
use std::time::Duration;

use super::{answer_from, candidate_from, offer_from, user_joined};
use crate::integration::{LOCAL_CLIENT_ID, create_test_room, init_tracing};
use crate::utils::{SETTLE_MS, drain_events, wait_for_event};

#[tokio::test]
async fn test_member_offer_is_answered_after_queued_candidate() {
    init_tracing();

    let mut room = create_test_room(&[("200", "Asha")]).await;

    // Candidate overtakes the offer.
    room.server.send(&candidate_from("200"));
    room.server.send(&offer_from("200"));

    let answer = room.server.next_of_type("answer").await;
    assert_eq!(answer["to_client"], "200");
    assert_eq!(answer["from"], LOCAL_CLIENT_ID);
    assert_eq!(answer["answer"]["type"], "answer");

    wait_for_event(&mut room.events, |e| {
        matches!(
            e,
            RoomEvent::PeerConnectionChanged {
                state: PeerConnectionState::Connected,
                ..
            }
        )
    })
    .await
    .unwrap();

    let peer = room.peers.peer("200").unwrap();
    assert_eq!(peer.received_candidates().len(), 1);
    assert_eq!(
        peer.remote_description(),
        Some(SessionDescription::offer("v=0 offer from 200"))
    );

    let snapshot = room.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.participants[0].negotiation, NegotiationState::Connected);
    assert_eq!(snapshot.participants[0].connection, PeerConnectionState::Connected);
}

#[tokio::test]
async fn test_local_candidates_are_relayed_to_their_peer() {
    init_tracing();

    let mut room = create_test_room(&[]).await;

    room.server.send(&user_joined("300", "Ravi"));

    let ice = room.server.next_of_type("ice_candidate").await;
    assert_eq!(ice["to_client"], "300");
    assert_eq!(ice["from"], LOCAL_CLIENT_ID);
    assert!(ice["candidate"]["candidate"].as_str().unwrap().starts_with("candidate:"));
}

#[tokio::test]
async fn test_answer_completes_our_offer() {
    init_tracing();

    let mut room = create_test_room(&[]).await;

    room.server.send(&user_joined("300", "Ravi"));
    room.server.next_of_type("offer").await;
    room.server.send(&answer_from("300"));
    room.server.send(&candidate_from("300"));

    wait_for_event(&mut room.events, |e| {
        matches!(
            e,
            RoomEvent::PeerConnectionChanged {
                state: PeerConnectionState::Connected,
                ..
            }
        )
    })
    .await
    .unwrap();

    let snapshot = room.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.participants[0].negotiation, NegotiationState::Connected);
}

#[tokio::test]
async fn test_frames_from_unknown_or_for_others_are_dropped() {
    init_tracing();

    let mut room = create_test_room(&[("200", "Asha")]).await;

    room.server.send(&answer_from("999"));
    room.server.send(&candidate_from("999"));
    room.server.send(&SignalingMessage::Offer {
        offer: SessionDescription::offer("v=0 for someone else"),
        to_client: "300".into(),
        from: Some("200".into()),
    });
    room.server
        .send_json(serde_json::json!({"type": "answer", "answer": {"type": "answer", "sdp": "v=0"}, "to_client": LOCAL_CLIENT_ID}));

    let frames = room
        .server
        .collect_frames(Duration::from_millis(SETTLE_MS))
        .await;
    assert!(frames.iter().all(|f| f["type"] != "answer"));

    let snapshot = room.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.participants.len(), 1);
    assert_eq!(snapshot.participants[0].negotiation, NegotiationState::New);
    assert_eq!(room.peers.created().len(), 1);
    assert!(room.peers.peer("200").unwrap().remote_description().is_none());
}

#[tokio::test]
async fn test_offer_collision_resolved_by_client_id() {
    init_tracing();

    let mut room = create_test_room(&[]).await;

    // "300" sorts after us: we keep our offer and wait for its answer.
    room.server.send(&user_joined("300", "Ravi"));
    room.server.next_of_type("offer").await;
    room.server.send(&offer_from("300"));

    let frames = room
        .server
        .collect_frames(Duration::from_millis(SETTLE_MS))
        .await;
    assert!(frames.iter().all(|f| f["type"] != "answer"));

    // "050" sorts before us: we yield and answer on a fresh connection.
    room.server.send(&user_joined("050", "Mei"));
    room.server.next_of_type("offer").await;
    let first = room.peers.peer("050").unwrap();
    room.server.send(&offer_from("050"));

    let answer = room.server.next_of_type("answer").await;
    assert_eq!(answer["to_client"], "050");
    assert!(first.is_closed());
    assert_eq!(
        room.peers
            .created()
            .iter()
            .filter(|p| p.participant().as_str() == "050")
            .count(),
        2
    );

    let snapshot = room.handle.snapshot().await.unwrap();
    let states: Vec<_> = snapshot
        .participants
        .iter()
        .map(|p| (p.id.as_str(), p.negotiation))
        .collect();
    assert_eq!(
        states,
        vec![
            ("050", NegotiationState::Connected),
            ("300", NegotiationState::Offering),
        ]
    );
}

#[tokio::test]
async fn test_replaced_connection_cannot_touch_its_successor() {
    init_tracing();

    let mut room = create_test_room(&[]).await;

    room.server.send(&user_joined("050", "Mei"));
    room.server.next_of_type("offer").await;
    let first = room.peers.peer("050").unwrap();
    room.server.send(&offer_from("050"));
    room.server.next_of_type("answer").await;

    let second = room.peers.peer("050").unwrap();
    assert!(first.is_closed());
    assert!(second.generation() > first.generation());

    // The old connection reported `Closed` on its way out; then it fails late.
    first.fail_connection().await;
    let events = drain_events(&mut room.events).await;
    assert!(!events.iter().any(|e| matches!(
        e,
        RoomEvent::PeerConnectionChanged { .. } | RoomEvent::ParticipantLeft { .. }
    )));

    let snapshot = room.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.participants.len(), 1);
    assert_eq!(snapshot.participants[0].connection, PeerConnectionState::New);
    assert!(!second.is_closed());

    // The live connection still gets through.
    second.fail_connection().await;
    let event = wait_for_event(&mut room.events, |e| {
        matches!(e, RoomEvent::ParticipantLeft { .. })
    })
    .await
    .unwrap();
    assert!(matches!(event, RoomEvent::ParticipantLeft { id, .. } if id.as_str() == "050"));
    assert!(second.is_closed());
}

#[tokio::test]
async fn test_remote_media_state_is_tracked() {
    init_tracing();

    let mut room = create_test_room(&[("200", "Asha")]).await;

    room.server.send_json(serde_json::json!({
        "type": "media_state_update",
        "client_id": "200",
        "isAudioEnabled": false,
        "isVideoEnabled": true,
        "isScreenSharing": true
    }));

    let event = wait_for_event(&mut room.events, |e| {
        matches!(e, RoomEvent::ParticipantMediaChanged { .. })
    })
    .await
    .unwrap();
    let RoomEvent::ParticipantMediaChanged { id, media } = event else {
        unreachable!()
    };
    assert_eq!(id.as_str(), "200");
    assert!(!media.audio_enabled && media.video_enabled && media.screen_sharing);
}
