use anyhow::{Result, bail};
use medico_room_client::RoomEvent;
use std::time::Duration;
use tokio::sync::mpsc;

/// Timeout for a single expected frame or event (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// Quiet period used to check that nothing else is sent (ms).
pub const SETTLE_MS: u64 = 200;

/// Waits for the first room event matching `pred`, skipping the others.
pub async fn wait_for_event<F>(
    events: &mut mpsc::UnboundedReceiver<RoomEvent>,
    mut pred: F,
) -> Result<RoomEvent>
where
    F: FnMut(&RoomEvent) -> bool,
{
    let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);

    loop {
        match tokio::time::timeout(timeout, events.recv()).await {
            Ok(Some(event)) if pred(&event) => return Ok(event),
            Ok(Some(_)) => continue,
            Ok(None) => bail!("Room event channel closed"),
            Err(_) => bail!("Timeout waiting for room event"),
        }
    }
}

/// Every event already queued or arriving within the settle period.
pub async fn drain_events(events: &mut mpsc::UnboundedReceiver<RoomEvent>) -> Vec<RoomEvent> {
    let mut drained = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(SETTLE_MS);
    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, events.recv()).await {
        drained.push(event);
    }
    drained
}
