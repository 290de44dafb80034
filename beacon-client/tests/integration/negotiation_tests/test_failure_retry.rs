use beacon_client::{SessionConfig, SessionEvent};
use beacon_core::ParticipantId;
use tokio::time::{Duration, sleep};

use crate::integration::init_tracing;
use crate::utils::{
    EVENT_TIMEOUT_MS, MockMediaSource, current_users, offer_from, spawn_peer,
};

/// The first failed round is retried silently on the next fresh offer;
/// the second consecutive failure surfaces to the caller. The session
/// stays alive throughout.
#[tokio::test]
async fn test_failed_round_retries_once_then_surfaces() {
    init_tracing();

    let mut peer = spawn_peer("bob", MockMediaSource::granting(), SessionConfig::default());
    let alice = ParticipantId::from("alice");

    peer.factory.fail_answers(true);

    peer.join_room("r1").await;
    peer.deliver(current_users(&["alice", "bob"])).await;
    peer.factory.wait_probe(&alice, EVENT_TIMEOUT_MS).await;

    // First failed round: logged, not surfaced.
    peer.deliver(offer_from("alice", "r1")).await;
    sleep(Duration::from_millis(100)).await;
    peer.assert_no_event("premature NegotiationFailed", |e| {
        matches!(e, SessionEvent::NegotiationFailed { .. })
    })
    .await;
    assert!(peer.channel.sent_of_kind("answer").is_empty());

    // Second failed round surfaces session-level failure.
    peer.deliver(offer_from("alice", "r1")).await;
    let event = peer
        .expect_event("NegotiationFailed", |e| {
            matches!(e, SessionEvent::NegotiationFailed { .. })
        })
        .await;
    assert!(
        matches!(event, SessionEvent::NegotiationFailed { peer: p, .. } if p == alice),
        "failure should name the remote peer"
    );

    // The session is still negotiating: a healthy round now succeeds.
    peer.factory.fail_answers(false);
    peer.deliver(offer_from("alice", "r1")).await;
    peer.channel.wait_for_kind("answer", EVENT_TIMEOUT_MS).await;
}
