use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::ConnectionId;

/// One room member: the connection and the display name it registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

/// A relayed chat message. Immutable once appended to a room's history;
/// `display_name` is the sender's name at the time of sending, not a stable
/// identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub display_name: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Stamps the message with the current time of receipt.
    pub fn new(display_name: &str, message: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            message: message.to_string(),
            sent_at: Utc::now(),
        }
    }
}

/// Live state of one room: membership in join order and the append-only
/// message history. History growth is unbounded for the room's lifetime.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub members: Vec<Member>,
    pub history: Vec<ChatMessage>,
}

impl Room {
    pub fn new(id: String) -> Self {
        Self {
            id,
            members: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn has_member(&self, connection_id: ConnectionId) -> bool {
        self.members
            .iter()
            .any(|m| m.connection_id == connection_id)
    }

    /// Adds a member, or updates the display name if the connection is
    /// already a member. Join order is preserved either way.
    pub fn add_member(&mut self, connection_id: ConnectionId, display_name: &str) {
        match self
            .members
            .iter_mut()
            .find(|m| m.connection_id == connection_id)
        {
            Some(member) => member.display_name = display_name.to_string(),
            None => self.members.push(Member {
                connection_id,
                display_name: display_name.to_string(),
            }),
        }
    }

    /// Removes a member and returns its display name, if it was present.
    pub fn remove_member(&mut self, connection_id: ConnectionId) -> Option<String> {
        let position = self
            .members
            .iter()
            .position(|m| m.connection_id == connection_id)?;
        Some(self.members.remove(position).display_name)
    }

    /// Display names in join order.
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.display_name.clone()).collect()
    }

    /// Connection ids of every member.
    pub fn member_connections(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.connection_id).collect()
    }

    /// Connection ids of every member except one, for fan-out that excludes
    /// the originator.
    pub fn member_connections_except(&self, excluded: ConnectionId) -> Vec<ConnectionId> {
        self.members
            .iter()
            .filter(|m| m.connection_id != excluded)
            .map(|m| m.connection_id)
            .collect()
    }
}
