use beacon_client::{SessionConfig, SessionEvent};
use beacon_core::{ParticipantId, SdpKind};
use tokio::time::{Duration, sleep};

use crate::integration::init_tracing;
use crate::utils::{
    EVENT_TIMEOUT_MS, MockMediaSource, TransportCall, current_users, offer_from, spawn_peer,
};

/// Both sides offered at once; the remotely-received offer wins and
/// exactly one offer survives for the session.
#[tokio::test]
async fn test_incoming_offer_wins_over_outstanding_local_offer() {
    init_tracing();

    let mut peer = spawn_peer("alice", MockMediaSource::granting(), SessionConfig::default());
    let bob = ParticipantId::from("bob");

    peer.create_room("r1").await;
    peer.deliver(current_users(&["alice", "bob"])).await;
    let probe = peer.factory.wait_probe(&bob, EVENT_TIMEOUT_MS).await;

    // Our own offer goes out first...
    probe.negotiation_needed().await;
    peer.channel.wait_for_kind("offer", EVENT_TIMEOUT_MS).await;

    // ...then bob's crossing offer arrives before any answer to ours.
    peer.deliver(offer_from("bob", "r1")).await;
    peer.channel.wait_for_kind("answer", EVENT_TIMEOUT_MS).await;

    // The local offer was abandoned: bob's offer was applied and answered.
    probe
        .wait_for_call(
            TransportCall::SetRemoteDescription(SdpKind::Offer),
            EVENT_TIMEOUT_MS,
        )
        .await;
    probe
        .wait_for_call(
            TransportCall::SetLocalDescription(SdpKind::Answer),
            EVENT_TIMEOUT_MS,
        )
        .await;

    // And no second offer is ever produced for this session.
    probe.negotiation_needed().await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(peer.channel.sent_of_kind("offer").len(), 1);

    // The session still completes normally.
    probe.remote_track("bob-cam").await;
    let event = peer
        .expect_event("PeerConnected", |e| {
            matches!(e, SessionEvent::PeerConnected(_))
        })
        .await;
    assert_eq!(event, SessionEvent::PeerConnected(bob));
}
