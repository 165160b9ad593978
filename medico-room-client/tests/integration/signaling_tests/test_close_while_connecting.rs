use medico_room_client::{SignalingEvent, SignalingOutput, SignalingTransport};
use std::time::Duration;
use tokio::time::{sleep, timeout};

use super::{test_identity, test_url};
use crate::integration::init_tracing;
use crate::utils::ScriptedConnector;

#[tokio::test]
async fn test_close_while_first_connect_hangs() {
    init_tracing();

    let (connector, _accepted) = ScriptedConnector::new();
    connector.set_hanging(true);
    let (handle, _events) = SignalingTransport::connect(
        connector.clone(),
        test_url(),
        test_identity(),
        Duration::from_secs(5),
    );

    sleep(Duration::from_millis(50)).await;
    assert_eq!(connector.attempts(), 1);

    // Frames queued during the attempt are dropped, not blocking.
    handle.send_chat("still dialing".into());

    timeout(Duration::from_secs(3), handle.close())
        .await
        .expect("close must not wait for the pending connect");
    assert!(!handle.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_close_while_reconnect_hangs() {
    init_tracing();

    let (connector, mut accepted) = ScriptedConnector::new();
    let (handle, mut events) = SignalingTransport::connect(
        connector.clone(),
        test_url(),
        test_identity(),
        Duration::from_millis(100),
    );

    let server = accepted.recv().await.unwrap();
    assert_eq!(events.recv().await, Some(SignalingEvent::Connected));

    connector.set_hanging(true);
    drop(server);
    assert_eq!(events.recv().await, Some(SignalingEvent::Disconnected));

    sleep(Duration::from_millis(500)).await;
    assert_eq!(connector.attempts(), 2);

    timeout(Duration::from_secs(3), handle.close())
        .await
        .expect("close must not wait for the pending reconnect");

    sleep(Duration::from_secs(1)).await;
    assert_eq!(connector.attempts(), 2);
}
