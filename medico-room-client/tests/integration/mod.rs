pub mod media_tests;
pub mod peer_tests;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use medico_room_client::{RoomConfig, RoomCoordinator, RoomDeps, RoomEvent, RoomHandle};
use medico_room_core::RoomAddress;

use crate::utils::{MockDevices, MockPeerFactory, ScriptedConnector, ServerSide};

pub const LOCAL_CLIENT_ID: &str = "100001";
pub const LOCAL_USER_ID: &str = "user-local";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> RoomConfig {
    RoomConfig {
        signaling_url: "ws://signal.test".into(),
        user_id: Some(LOCAL_USER_ID.into()),
        display_name: Some("Local".into()),
        ..Default::default()
    }
}

pub struct TestRoom {
    pub handle: RoomHandle,
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
    pub server: ServerSide,
    pub connector: Arc<ScriptedConnector>,
    pub peers: Arc<MockPeerFactory>,
    pub devices: Arc<MockDevices>,
    /// Later connections of the same client, e.g. after a reconnect.
    pub accepted: mpsc::UnboundedReceiver<ServerSide>,
}

/// Joins room 123456 through a scripted server that already hosts `others`.
/// Returns once the client has announced its media state.
pub async fn create_test_room(others: &[(&str, &str)]) -> TestRoom {
    create_test_room_with(test_config(), MockDevices::new(), others).await
}

pub async fn create_test_room_with(
    config: RoomConfig,
    devices: Arc<MockDevices>,
    others: &[(&str, &str)],
) -> TestRoom {
    let (connector, mut accepted) = ScriptedConnector::new();
    let peers = MockPeerFactory::new();
    let deps = RoomDeps {
        connector: connector.clone(),
        peers: peers.clone(),
        devices: devices.clone(),
    };

    let address = RoomAddress::parse("123456", "pw").unwrap();
    let (handle, events) = RoomCoordinator::join(address, config, deps)
        .await
        .expect("join failed");

    let mut server = accepted.recv().await.expect("client never connected");
    server.accept(LOCAL_CLIENT_ID, others).await;
    server.next_of_type("media_state_update").await;

    TestRoom {
        handle,
        events,
        server,
        connector,
        peers,
        devices,
        accepted,
    }
}
