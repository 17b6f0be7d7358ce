use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::event::{EventRouter, InboundEvent, OutboundDelivery};
use crate::registry::ConnectionId;
use crate::shared::AppState;
use crate::ws::connection_manager::ConnectionManager;
use crate::ws::messages::WsEnvelope;
use crate::ws::socket::{Connection, FrameHandler};

/// Frame handler that decodes wire envelopes, dispatches them through the
/// event router, and delivers the resulting fan-out.
pub struct RelayFrameHandler {
    event_router: Arc<EventRouter>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl RelayFrameHandler {
    pub fn new(
        event_router: Arc<EventRouter>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            event_router,
            connection_manager,
        }
    }

    /// Synthesizes the disconnect event for a connection whose socket has
    /// gone away.
    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        self.dispatch_and_deliver(connection_id, InboundEvent::Disconnect)
            .await;
    }

    async fn dispatch_and_deliver(&self, connection_id: ConnectionId, event: InboundEvent) {
        match self.event_router.dispatch(connection_id, event).await {
            Ok(deliveries) => deliver(&self.connection_manager, &deliveries).await,
            Err(e) => {
                // Nothing in the taxonomy is fatal to the process; the
                // failed request is scoped to this connection.
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Event dispatch failed"
                );
            }
        }
    }
}

#[async_trait]
impl FrameHandler for RelayFrameHandler {
    async fn handle_frame(&self, connection_id: ConnectionId, frame: String) {
        let envelope = match serde_json::from_str::<WsEnvelope>(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket frame"
                );
                return;
            }
        };

        let event = match envelope.into_inbound() {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Rejected inbound frame"
                );
                return;
            }
        };

        self.dispatch_and_deliver(connection_id, event).await;
    }
}

/// Serializes each delivery once and fans it out to its recipient set.
async fn deliver(connection_manager: &Arc<dyn ConnectionManager>, deliveries: &[OutboundDelivery]) {
    for delivery in deliveries {
        let envelope = WsEnvelope::from_outbound(&delivery.event);
        match serde_json::to_string(&envelope) {
            Ok(frame) => {
                connection_manager
                    .send_to_connections(&delivery.recipients, &frame)
                    .await;
            }
            Err(e) => {
                warn!(
                    event_type = delivery.event.event_type(),
                    error = %e,
                    "Failed to serialize outbound event"
                );
            }
        }
    }
}

/// WebSocket endpoint: GET /ws. Each upgraded socket gets a fresh opaque
/// connection id; no authentication, a display name arrives with the first
/// create/join event.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    let connection_id = ConnectionId::new();
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Outbound channel (relay -> client), registered before any event can
    // target this connection.
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    app_state
        .connection_manager
        .add_connection(connection_id, outbound_sender)
        .await;

    let frame_handler = Arc::new(RelayFrameHandler::new(
        app_state.event_router.clone(),
        app_state.connection_manager.clone(),
    ));

    let connection = Connection::new(
        connection_id,
        Box::new(socket),
        outbound_receiver,
        frame_handler.clone(),
    );

    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: drop the channel first so the disconnect fan-out never
    // targets the closing socket, then synthesize the disconnect event.
    // Abrupt network loss lands here too; the core has no timeout logic of
    // its own.
    app_state
        .connection_manager
        .remove_connection(connection_id)
        .await;

    frame_handler.handle_disconnect(connection_id).await;

    info!(connection_id = %connection_id, "Disconnect processed");
}
