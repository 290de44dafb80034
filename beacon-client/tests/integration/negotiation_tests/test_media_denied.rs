use beacon_client::{SessionCommand, SessionConfig, SessionEvent};
use beacon_core::{ContentType, ParticipantId};

use crate::integration::init_tracing;
use crate::utils::{MockMediaSource, current_users, spawn_peer};

/// Media denial is terminal: the room is never entered and no
/// negotiation can start.
#[tokio::test]
async fn test_media_denial_prevents_joining() {
    init_tracing();

    let mut peer = spawn_peer("carol", MockMediaSource::denying(), SessionConfig::default());

    // Raw command send: no join envelope will ever go out.
    peer.commands
        .send(SessionCommand::JoinRoom {
            room: "r1".to_owned(),
            content_type: ContentType::Video,
        })
        .await
        .unwrap();

    let event = peer
        .expect_event("MediaDenied", |e| matches!(e, SessionEvent::MediaDenied(_)))
        .await;
    assert!(matches!(event, SessionEvent::MediaDenied(reason) if reason.contains("dismissed")));

    // No join went out, and a membership broadcast cannot start sessions.
    assert!(peer.channel.sent().is_empty());
    peer.deliver(current_users(&["alice", "carol"])).await;
    peer.assert_no_event("any event after denial", |e| {
        matches!(e, SessionEvent::PeerConnected(_))
    })
    .await;
    assert!(peer.factory.probe(&ParticipantId::from("alice")).is_none());
}
