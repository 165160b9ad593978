
use medico_room_core::{MediaKind, SignalingMessage};

use super::TestRoom;

/// Joins `ids` as newcomers and waits until every one of them got an offer,
/// so our tracks sit on their senders.
pub async fn offer_to(room: &mut TestRoom, ids: &[&str]) {
    for id in ids {
        room.server.send(&SignalingMessage::UserJoined {
            client_id: (*id).into(),
            username: format!("Guest {id}"),
            user_id: None,
        });
        room.server.next_of_type("offer").await;
    }
}

pub fn video_senders(room: &TestRoom, ids: &[&str]) -> Vec<Option<String>> {
    ids.iter()
        .map(|id| {
            room.peers
                .peer(id)
                .and_then(|p| p.sender(MediaKind::Video))
                .map(|t| t.device_id().to_owned())
        })
        .collect()
}
