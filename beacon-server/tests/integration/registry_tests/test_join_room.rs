use beacon_core::{ContentType, ParticipantId, SignalError};

use crate::integration::{create_test_registry, init_tracing};

#[tokio::test]
async fn test_join_missing_room_fails() {
    init_tracing();

    let (registry, _output) = create_test_registry();

    let err = registry
        .join_room("nowhere", ParticipantId::from("bob"), ContentType::Video)
        .unwrap_err();

    assert!(matches!(err, SignalError::RoomNotFound(room) if room == "nowhere"));
}

#[tokio::test]
async fn test_join_broadcasts_current_users_in_join_order() {
    init_tracing();

    let (registry, output) = create_test_registry();
    let alice = ParticipantId::from("alice");
    let bob = ParticipantId::from("bob");
    let carol = ParticipantId::from("carol");

    registry
        .create_room("r1", alice.clone(), ContentType::Video)
        .unwrap();
    registry
        .join_room("r1", bob.clone(), ContentType::Video)
        .unwrap();
    registry
        .join_room("r1", carol.clone(), ContentType::Video)
        .unwrap();

    let expected = vec![alice.clone(), bob.clone(), carol.clone()];
    assert_eq!(registry.members_of("r1"), Some(expected.clone()));

    // Every member saw the final membership, in join order.
    for member in [&alice, &bob, &carol] {
        assert_eq!(
            output.last_current_users_for(member),
            Some(expected.clone()),
            "{member} saw a stale user list"
        );
    }
}

#[tokio::test]
async fn test_member_set_tracks_joins_and_leaves() {
    init_tracing();

    let (registry, _output) = create_test_registry();
    let alice = ParticipantId::from("alice");
    let bob = ParticipantId::from("bob");
    let carol = ParticipantId::from("carol");

    registry
        .create_room("r1", alice.clone(), ContentType::Video)
        .unwrap();
    registry
        .join_room("r1", bob.clone(), ContentType::Video)
        .unwrap();
    registry
        .join_room("r1", carol.clone(), ContentType::Video)
        .unwrap();
    registry.leave(&bob);

    assert_eq!(registry.members_of("r1"), Some(vec![alice, carol]));
}
