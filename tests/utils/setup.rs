use std::sync::Arc;

use roomrelay::ws::{FrameHandler, RelayFrameHandler, WsEnvelope};
use roomrelay::{
    ConnectionId, ConnectionManager, ConnectionRegistry, EventRouter, InMemoryRoomStore,
    MessageType, RandomRoomIdGenerator,
};

use super::mocks::MockConnectionManager;

/// Full relay wired against the mock connection manager: real store,
/// registry, and router, driven through the same frame handler the socket
/// loop uses, so tests cover decode -> dispatch -> fan-out.
pub struct TestSetup {
    pub handler: RelayFrameHandler,
    pub store: Arc<InMemoryRoomStore>,
    pub mock: Arc<MockConnectionManager>,
}

impl TestSetup {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryRoomStore::new(Box::new(
            RandomRoomIdGenerator::new(),
        )));
        let registry = Arc::new(ConnectionRegistry::new());
        let event_router = Arc::new(EventRouter::new(store.clone(), registry));
        let mock = Arc::new(MockConnectionManager::new());
        let connection_manager: Arc<dyn ConnectionManager> = mock.clone();

        Self {
            handler: RelayFrameHandler::new(event_router, connection_manager),
            store,
            mock,
        }
    }

    /// Delivers one raw wire frame as if it arrived on the connection.
    pub async fn send_frame(&self, connection_id: ConnectionId, frame: &str) {
        self.handler.handle_frame(connection_id, frame.to_string()).await;
    }

    /// Creates a room over the wire and returns the generated room id from
    /// the room-created frame.
    pub async fn create_room(&self, connection_id: ConnectionId, display_name: &str) -> String {
        let frame = format!(r#"{{"type": "create-room", "payload": "{display_name}"}}"#);
        self.send_frame(connection_id, &frame).await;

        let envelope = self
            .last_envelope_for(connection_id)
            .await
            .expect("room-created frame");
        assert_eq!(envelope.message_type, MessageType::RoomCreated);
        envelope.payload.as_str().expect("room id payload").to_string()
    }

    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        display_name: &str,
    ) {
        let frame = format!(
            r#"{{"type": "join-room", "payload": {{"roomId": "{room_id}", "displayName": "{display_name}"}}}}"#
        );
        self.send_frame(connection_id, &frame).await;
    }

    pub async fn send_message(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        display_name: &str,
        message: &str,
    ) {
        let frame = format!(
            r#"{{"type": "send-message", "payload": {{"roomId": "{room_id}", "message": "{message}", "displayName": "{display_name}"}}}}"#
        );
        self.send_frame(connection_id, &frame).await;
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        self.handler.handle_disconnect(connection_id).await;
    }

    /// Every frame delivered to a connection, decoded.
    pub async fn envelopes_for(&self, connection_id: ConnectionId) -> Vec<WsEnvelope> {
        self.mock
            .frames_for(connection_id)
            .await
            .iter()
            .map(|frame| serde_json::from_str(frame).expect("valid outbound frame"))
            .collect()
    }

    pub async fn last_envelope_for(&self, connection_id: ConnectionId) -> Option<WsEnvelope> {
        self.envelopes_for(connection_id).await.pop()
    }

    pub async fn clear_frames(&self) {
        self.mock.clear().await;
    }
}
