use medico_room_client::{LocalSession, NegotiationState, PeerSession};
use medico_room_core::SessionDescription;

use super::candidate;
use crate::integration::init_tracing;
use crate::utils::standalone_connection;

#[tokio::test]
async fn test_candidates_before_offer_are_replayed() {
    init_tracing();

    let (connection, peer, _events) = standalone_connection("remote");
    let mut session = PeerSession::new("remote".into(), connection);
    let local = LocalSession::new(true, true);

    session.add_remote_candidate(candidate(1)).await.unwrap();
    session.add_remote_candidate(candidate(2)).await.unwrap();
    assert_eq!(session.queued_candidates(), 2);
    assert!(peer.received_candidates().is_empty());

    let answer = session
        .accept_offer(SessionDescription::offer("v=0 remote"), &local)
        .await
        .unwrap();

    assert_eq!(answer, peer.local_description().unwrap());
    assert_eq!(session.state(), NegotiationState::Connected);
    assert_eq!(session.queued_candidates(), 0);
    assert_eq!(peer.received_candidates(), vec![candidate(1), candidate(2)]);
    assert!(peer.is_connected());
}

#[tokio::test]
async fn test_candidates_before_answer_match_in_order_case() {
    init_tracing();

    let local = LocalSession::new(true, true);

    // Candidate arrives ahead of the answer.
    let (connection, early_peer, _early_events) = standalone_connection("early");
    let mut early = PeerSession::new("early".into(), connection);
    early.start_offer(&local).await.unwrap();
    early.add_remote_candidate(candidate(7)).await.unwrap();
    early
        .accept_answer(SessionDescription::answer("v=0 early"))
        .await
        .unwrap();

    // Same exchange, in order.
    let (connection, ordered_peer, _ordered_events) = standalone_connection("ordered");
    let mut ordered = PeerSession::new("ordered".into(), connection);
    ordered.start_offer(&local).await.unwrap();
    ordered
        .accept_answer(SessionDescription::answer("v=0 ordered"))
        .await
        .unwrap();
    ordered.add_remote_candidate(candidate(7)).await.unwrap();

    assert_eq!(early.state(), NegotiationState::Connected);
    assert_eq!(early.state(), ordered.state());
    assert_eq!(
        early_peer.received_candidates(),
        ordered_peer.received_candidates()
    );
    assert!(early_peer.is_connected() && ordered_peer.is_connected());
}

#[tokio::test]
async fn test_close_discards_queue_and_later_candidates() {
    init_tracing();

    let (connection, peer, _events) = standalone_connection("remote");
    let mut session = PeerSession::new("remote".into(), connection);
    session.add_remote_candidate(candidate(1)).await.unwrap();

    session.close().await;
    session.add_remote_candidate(candidate(2)).await.unwrap();

    assert_eq!(session.state(), NegotiationState::Closed);
    assert_eq!(session.queued_candidates(), 0);
    assert!(peer.is_closed());
    assert!(peer.received_candidates().is_empty());
}
