use beacon_client::{SessionCommand, SessionEvent};
use beacon_core::{ContentType, IceCandidate, ParticipantId, SdpKind};

use crate::integration::e2e_tests::{EVENT_TIMEOUT_MS, connect_peer, start_server};
use crate::integration::init_tracing;
use crate::utils::TransportCall;

/// The full scenario: create/join, membership broadcast, one offer, one
/// answer, trickled candidates, both sides connected, clean teardown on
/// leave.
#[tokio::test]
async fn test_two_clients_negotiate_end_to_end() {
    init_tracing();

    let addr = start_server().await;
    let mut alice = connect_peer(addr, "alice").await;
    let mut bob = connect_peer(addr, "bob").await;
    let alice_id = ParticipantId::from("alice");
    let bob_id = ParticipantId::from("bob");

    alice
        .commands
        .send(SessionCommand::CreateRoom {
            room: "r1".to_owned(),
            content_type: ContentType::Video,
        })
        .await
        .unwrap();
    alice
        .expect_event("roomList with r1", |e| {
            matches!(e, SessionEvent::RoomList(rooms) if rooms.contains(&"r1".to_owned()))
        })
        .await;

    bob.commands
        .send(SessionCommand::JoinRoom {
            room: "r1".to_owned(),
            content_type: ContentType::Video,
        })
        .await
        .unwrap();

    let expected_users = vec![alice_id.clone(), bob_id.clone()];
    for peer in [&mut alice, &mut bob] {
        let event = peer
            .expect_event("currentUsers pair", |e| {
                matches!(e, SessionEvent::CurrentUsers(users) if users.len() == 2)
            })
            .await;
        assert_eq!(event, SessionEvent::CurrentUsers(expected_users.clone()));
    }

    let probe_a = alice.factory.wait_probe(&bob_id, EVENT_TIMEOUT_MS).await;
    let probe_b = bob.factory.wait_probe(&alice_id, EVENT_TIMEOUT_MS).await;

    // Alice's transport asks for negotiation; her offer crosses the
    // registry and bob answers it.
    probe_a.negotiation_needed().await;
    probe_b
        .wait_for_call(
            TransportCall::SetRemoteDescription(SdpKind::Offer),
            EVENT_TIMEOUT_MS,
        )
        .await;
    probe_b
        .wait_for_call(
            TransportCall::SetLocalDescription(SdpKind::Answer),
            EVENT_TIMEOUT_MS,
        )
        .await;
    probe_a
        .wait_for_call(
            TransportCall::SetRemoteDescription(SdpKind::Answer),
            EVENT_TIMEOUT_MS,
        )
        .await;

    // A trickled candidate reaches the other transport.
    probe_a
        .local_candidate(IceCandidate {
            candidate: "candidate:842163049 1 udp 1677729535 1.2.3.4 46154 typ srflx".to_owned(),
            sdp_mid: Some("0".to_owned()),
            sdp_m_line_index: Some(0),
            username_fragment: None,
        })
        .await;
    probe_b
        .wait_for_call(
            TransportCall::AddIceCandidate(
                "candidate:842163049 1 udp 1677729535 1.2.3.4 46154 typ srflx".to_owned(),
            ),
            EVENT_TIMEOUT_MS,
        )
        .await;

    // Media flows both ways.
    probe_a.remote_track("bob-cam").await;
    probe_b.remote_track("alice-cam").await;
    let event = alice
        .expect_event("alice PeerConnected", |e| {
            matches!(e, SessionEvent::PeerConnected(_))
        })
        .await;
    assert_eq!(event, SessionEvent::PeerConnected(bob_id.clone()));
    let event = bob
        .expect_event("bob PeerConnected", |e| {
            matches!(e, SessionEvent::PeerConnected(_))
        })
        .await;
    assert_eq!(event, SessionEvent::PeerConnected(alice_id.clone()));

    // Bob leaves; alice is told and releases her transport.
    bob.commands.send(SessionCommand::Leave).await.unwrap();
    let event = alice
        .expect_event("PeerLeft bob", |e| matches!(e, SessionEvent::PeerLeft(_)))
        .await;
    assert_eq!(event, SessionEvent::PeerLeft(bob_id));
    probe_a.wait_for_call(TransportCall::Close, EVENT_TIMEOUT_MS).await;
}
