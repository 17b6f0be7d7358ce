use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use roomrelay::{ConnectionId, ConnectionManager};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Connection manager that records every frame sent to every connection,
/// so workflow tests can assert on exact fan-out.
#[derive(Clone)]
pub struct MockConnectionManager {
    sent_frames: Arc<RwLock<HashMap<ConnectionId, Vec<String>>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self {
            sent_frames: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn frames_for(&self, connection_id: ConnectionId) -> Vec<String> {
        self.sent_frames
            .read()
            .await
            .get(&connection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn clear(&self) {
        self.sent_frames.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(
        &self,
        _connection_id: ConnectionId,
        _sender: mpsc::UnboundedSender<String>,
    ) {
    }

    async fn remove_connection(&self, _connection_id: ConnectionId) {}

    async fn send_to_connection(&self, connection_id: ConnectionId, message: &str) {
        self.sent_frames
            .write()
            .await
            .entry(connection_id)
            .or_default()
            .push(message.to_string());
    }

    async fn send_to_connections(&self, connection_ids: &[ConnectionId], message: &str) {
        for connection_id in connection_ids {
            self.send_to_connection(*connection_id, message).await;
        }
    }
}
