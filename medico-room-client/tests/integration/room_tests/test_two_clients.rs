use medico_room_client::{
    PeerConnectionState, RoomConfig, RoomCoordinator, RoomDeps, RoomEvent, RoomHandle,
};
use medico_room_core::{MediaKind, RoomAddress};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{MockDevices, MockNetwork, MockPeerFactory, RelayServer, wait_for_event};

struct Client {
    handle: RoomHandle,
    events: mpsc::UnboundedReceiver<RoomEvent>,
    devices: Arc<MockDevices>,
}

async fn join(relay: &Arc<RelayServer>, network: &MockNetwork, name: &str) -> Client {
    let config = RoomConfig {
        signaling_url: "ws://signal.test".into(),
        user_id: Some(format!("user-{name}")),
        display_name: Some(name.into()),
        ..Default::default()
    };
    let devices = MockDevices::new();
    let deps = RoomDeps {
        connector: relay.clone(),
        peers: MockPeerFactory::on_network(network.clone()),
        devices: devices.clone(),
    };

    let address = RoomAddress::parse("123456", "pw").unwrap();
    let (handle, mut events) = RoomCoordinator::join(address, config, deps).await.unwrap();
    wait_for_event(&mut events, |e| {
        matches!(e, RoomEvent::SignalingConnected(true))
    })
    .await
    .unwrap();

    Client {
        handle,
        events,
        devices,
    }
}

async fn wait_connected(client: &mut Client) {
    wait_for_event(&mut client.events, |e| {
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
}

async fn wait_remote_video(client: &mut Client) -> String {
    let event = wait_for_event(&mut client.events, |e| {
        matches!(e, RoomEvent::RemoteTrack { track, .. } if track.kind == MediaKind::Video)
    })
    .await
    .unwrap();
    let RoomEvent::RemoteTrack { track, .. } = event else {
        unreachable!()
    };
    track.id
}

#[tokio::test]
async fn test_two_clients_see_each_other() {
    init_tracing();

    let relay = RelayServer::new();
    let network = MockNetwork::default();

    let mut asha = join(&relay, &network, "Asha").await;
    let mut ravi = join(&relay, &network, "Ravi").await;

    wait_connected(&mut asha).await;
    wait_connected(&mut ravi).await;

    let camera_of = |client: &Client| {
        client
            .devices
            .opened()
            .into_iter()
            .find(|t| t.kind() == MediaKind::Video)
            .unwrap()
            .id()
            .to_owned()
    };
    assert_eq!(wait_remote_video(&mut asha).await, camera_of(&ravi));
    assert_eq!(wait_remote_video(&mut ravi).await, camera_of(&asha));

    let seen_by_asha = asha.handle.snapshot().await.unwrap();
    assert_eq!(seen_by_asha.participants.len(), 1);
    assert_eq!(seen_by_asha.participants[0].name, "Ravi");
    let seen_by_ravi = ravi.handle.snapshot().await.unwrap();
    assert_eq!(seen_by_ravi.participants[0].name, "Asha");
    assert_ne!(seen_by_asha.local_id, seen_by_ravi.local_id);

    ravi.handle.send_chat("Good morning").await.unwrap();
    let event = wait_for_event(&mut asha.events, |e| matches!(e, RoomEvent::Chat(_)))
        .await
        .unwrap();
    assert!(matches!(event, RoomEvent::Chat(m) if m.sender == "Ravi" && m.content == "Good morning"));

    ravi.handle.leave().await.unwrap();
    let event = wait_for_event(&mut asha.events, |e| {
        matches!(e, RoomEvent::ParticipantLeft { .. })
    })
    .await
    .unwrap();
    assert!(matches!(event, RoomEvent::ParticipantLeft { name, .. } if name == "Ravi"));
    assert_eq!(relay.room_size("123456"), 1);
}
