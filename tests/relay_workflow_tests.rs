use rstest::rstest;

use roomrelay::{ConnectionId, MessageType, RoomStore};

mod utils;

use utils::*;

#[tokio::test]
async fn test_create_room_returns_short_uppercase_id_to_requester_only() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let bystander = ConnectionId::new();

    let room_id = setup.create_room(alice, "alice").await;

    assert_eq!(room_id.len(), 6);
    assert!(room_id
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert!(setup.envelopes_for(bystander).await.is_empty());
}

#[tokio::test]
async fn test_join_notifies_existing_members_and_sends_snapshot_to_joiner() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();
    let room_id = setup.create_room(alice, "alice").await;
    setup.clear_frames().await;

    setup.join_room(bob, &room_id, "bob").await;

    // Alice gets exactly one user-joined carrying bob's name.
    let alice_frames = setup.envelopes_for(alice).await;
    assert_eq!(alice_frames.len(), 1);
    assert_eq!(alice_frames[0].message_type, MessageType::UserJoined);
    assert_eq!(alice_frames[0].payload, "bob");

    // Bob gets one room-joined with the post-join member list and empty
    // history.
    let bob_frames = setup.envelopes_for(bob).await;
    assert_eq!(bob_frames.len(), 1);
    assert_eq!(bob_frames[0].message_type, MessageType::RoomJoined);
    let payload = &bob_frames[0].payload;
    assert_eq!(payload["roomId"], room_id);
    assert_eq!(payload["users"], serde_json::json!(["alice", "bob"]));
    assert_eq!(payload["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn test_join_unknown_room_errors_without_side_effects() {
    let setup = TestSetup::new();
    let bob = ConnectionId::new();

    setup.join_room(bob, "NOPE42", "bob").await;

    let frames = setup.envelopes_for(bob).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].message_type, MessageType::Error);
    assert_eq!(frames[0].payload, "Room not found");
    assert_eq!(setup.store.room_count(), 0);
}

#[tokio::test]
async fn test_message_reaches_every_member_including_sender() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();
    let room_id = setup.create_room(alice, "alice").await;
    setup.join_room(bob, &room_id, "bob").await;
    setup.clear_frames().await;

    setup.send_message(alice, &room_id, "alice", "hi").await;

    for conn in [alice, bob] {
        let frames = setup.envelopes_for(conn).await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].message_type, MessageType::NewMessage);
        assert_eq!(frames[0].payload["displayName"], "alice");
        assert_eq!(frames[0].payload["message"], "hi");
        assert!(frames[0].payload.get("sentAt").is_some());
    }

    let history = setup.store.get_room(&room_id).await.unwrap().history;
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_message_to_unknown_room_errors_back_to_sender() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();

    setup.send_message(alice, "NOPE42", "alice", "hi").await;

    let frames = setup.envelopes_for(alice).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].message_type, MessageType::Error);
    assert_eq!(frames[0].payload, "Room not found");
}

#[tokio::test]
async fn test_late_joiner_receives_prior_history_in_append_order() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();
    let room_id = setup.create_room(alice, "alice").await;

    setup.send_message(alice, &room_id, "alice", "first").await;
    setup.send_message(alice, &room_id, "alice", "second").await;
    setup.clear_frames().await;

    setup.join_room(bob, &room_id, "bob").await;

    let frames = setup.envelopes_for(bob).await;
    assert_eq!(frames[0].message_type, MessageType::RoomJoined);
    let messages = frames[0].payload["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["message"], "first");
    assert_eq!(messages[1]["message"], "second");
}

#[tokio::test]
async fn test_disconnect_notifies_remaining_members_and_keeps_room() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();
    let room_id = setup.create_room(alice, "alice").await;
    setup.join_room(bob, &room_id, "bob").await;
    setup.clear_frames().await;

    setup.disconnect(bob).await;

    let alice_frames = setup.envelopes_for(alice).await;
    assert_eq!(alice_frames.len(), 1);
    assert_eq!(alice_frames[0].message_type, MessageType::UserLeft);
    assert_eq!(alice_frames[0].payload, "bob");

    // The leaver itself gets nothing.
    assert!(setup.envelopes_for(bob).await.is_empty());
    assert_eq!(
        setup.store.list_members(&room_id).await.unwrap(),
        vec!["alice"]
    );
}

#[tokio::test]
async fn test_disconnecting_sole_member_deletes_room() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let room_id = setup.create_room(alice, "alice").await;
    setup.clear_frames().await;

    setup.disconnect(alice).await;

    assert!(setup.envelopes_for(alice).await.is_empty());
    assert!(setup.store.get_room(&room_id).await.is_none());
    assert_eq!(setup.store.room_count(), 0);
}

#[tokio::test]
async fn test_disconnect_of_never_joined_connection_is_silent() {
    let setup = TestSetup::new();
    let stranger = ConnectionId::new();

    setup.disconnect(stranger).await;

    assert!(setup.envelopes_for(stranger).await.is_empty());
}

#[tokio::test]
async fn test_moving_to_another_room_releases_the_first() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();
    let carol = ConnectionId::new();
    let first = setup.create_room(alice, "alice").await;
    setup.join_room(bob, &first, "bob").await;
    let second = setup.create_room(carol, "carol").await;
    setup.clear_frames().await;

    setup.join_room(bob, &second, "bob").await;

    // Alice sees bob leave the first room.
    let alice_frames = setup.envelopes_for(alice).await;
    assert_eq!(alice_frames.len(), 1);
    assert_eq!(alice_frames[0].message_type, MessageType::UserLeft);
    assert_eq!(alice_frames[0].payload, "bob");

    // Carol sees him arrive in the second.
    let carol_frames = setup.envelopes_for(carol).await;
    assert_eq!(carol_frames.len(), 1);
    assert_eq!(carol_frames[0].message_type, MessageType::UserJoined);
    assert_eq!(carol_frames[0].payload, "bob");

    // Bob holds exactly one membership.
    assert_eq!(
        setup.store.list_members(&first).await.unwrap(),
        vec!["alice"]
    );
    assert_eq!(
        setup.store.list_members(&second).await.unwrap(),
        vec!["carol", "bob"]
    );

    // And a single disconnect per connection reclaims every room.
    setup.disconnect(alice).await;
    setup.disconnect(bob).await;
    setup.disconnect(carol).await;
    assert_eq!(setup.store.room_count(), 0);
}

#[rstest]
#[case::not_json("this is not json")]
#[case::unknown_type(r#"{"type": "rename-room", "payload": "alice"}"#)]
#[case::outbound_type(r#"{"type": "room-created", "payload": "X1Y2Z3"}"#)]
#[case::wrong_payload_shape(r#"{"type": "join-room", "payload": 42}"#)]
#[tokio::test]
async fn test_invalid_frames_are_dropped_without_fallout(#[case] frame: &str) {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();

    setup.send_frame(alice, frame).await;

    assert!(setup.envelopes_for(alice).await.is_empty());
    assert_eq!(setup.store.room_count(), 0);
}

/// The full relay lifecycle: create, join, chat, leave, empty-room cleanup.
#[tokio::test]
async fn test_full_room_lifecycle() {
    let setup = TestSetup::new();
    let alice = ConnectionId::new();
    let bob = ConnectionId::new();

    // Alice creates a room and is its first member.
    let room_id = setup.create_room(alice, "alice").await;

    // Bob joins: alice is notified, bob gets the snapshot.
    setup.join_room(bob, &room_id, "bob").await;
    let alice_last = setup.last_envelope_for(alice).await.unwrap();
    assert_eq!(alice_last.message_type, MessageType::UserJoined);
    assert_eq!(alice_last.payload, "bob");
    let bob_last = setup.last_envelope_for(bob).await.unwrap();
    assert_eq!(bob_last.payload["users"], serde_json::json!(["alice", "bob"]));
    assert_eq!(bob_last.payload["messages"], serde_json::json!([]));

    // Alice says hi: both see the canonical stored copy.
    setup.clear_frames().await;
    setup.send_message(alice, &room_id, "alice", "hi").await;
    for conn in [alice, bob] {
        let last = setup.last_envelope_for(conn).await.unwrap();
        assert_eq!(last.message_type, MessageType::NewMessage);
        assert_eq!(last.payload["displayName"], "alice");
        assert_eq!(last.payload["message"], "hi");
    }

    // Bob disconnects: alice is told, the room survives with one member.
    setup.clear_frames().await;
    setup.disconnect(bob).await;
    let alice_last = setup.last_envelope_for(alice).await.unwrap();
    assert_eq!(alice_last.message_type, MessageType::UserLeft);
    assert_eq!(alice_last.payload, "bob");
    assert_eq!(
        setup.store.list_members(&room_id).await.unwrap(),
        vec!["alice"]
    );

    // Alice disconnects: the room is gone.
    setup.disconnect(alice).await;
    assert!(setup.store.get_room(&room_id).await.is_none());
}
