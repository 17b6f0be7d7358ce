use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::id::RoomIdGenerator;
use super::models::{ChatMessage, Room};
use crate::registry::ConnectionId;
use crate::shared::AppError;

/// Bounded retry for id generation. With a 36^6 id space, exhausting this
/// many draws against live rooms means the id space is effectively full.
const MAX_ID_ATTEMPTS: usize = 16;

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Joined; carries a snapshot taken after the membership write.
    Joined {
        /// Display names in join order, including the joiner.
        members: Vec<String>,
        /// Full message history in append order, unaffected by the join.
        history: Vec<ChatMessage>,
        /// Connections of every member except the joiner.
        others: Vec<ConnectionId>,
    },
    /// Room does not exist
    RoomNotFound,
}

/// Result of removing a member from a room
#[derive(Debug, Clone)]
pub enum RemoveMemberResult {
    /// Removed; the room still has members.
    Removed {
        display_name: String,
        /// Connections of the members that remain.
        remaining: Vec<ConnectionId>,
    },
    /// Removed, and the room was deleted because it became empty.
    RoomDeleted { display_name: String },
    /// The connection was not a member of the room.
    NotAMember,
    /// Room does not exist
    RoomNotFound,
}

/// Result of appending a message to a room's history
#[derive(Debug, Clone)]
pub enum AppendMessageResult {
    /// Appended; carries the stored copy and the fan-out set computed under
    /// the same lock as the append.
    Appended {
        message: ChatMessage,
        recipients: Vec<ConnectionId>,
    },
    /// Room does not exist
    RoomNotFound,
}

/// Trait for room store operations
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Creates a room with a fresh store-unique id; the creator is its first
    /// member (creation implies membership).
    async fn create_room(
        &self,
        creator: ConnectionId,
        display_name: &str,
    ) -> Result<Room, AppError>;

    async fn get_room(&self, room_id: &str) -> Option<Room>;

    /// Atomically adds a member and snapshots the room state after the write,
    /// so the joiner sees a membership list that already includes itself.
    /// Re-joining is idempotent and updates the stored display name.
    async fn join_room(
        &self,
        room_id: &str,
        connection_id: ConnectionId,
        display_name: &str,
    ) -> JoinRoomResult;

    /// Atomically removes a member; if the room is emptied it is deleted in
    /// the same step, leaving no window where an empty room is discoverable.
    async fn remove_member(&self, room_id: &str, connection_id: ConnectionId)
        -> RemoveMemberResult;

    /// Atomically appends a message and computes the member fan-out set.
    async fn append_message(
        &self,
        room_id: &str,
        display_name: &str,
        body: &str,
    ) -> AppendMessageResult;

    /// Display names in join order, or None if the room does not exist.
    async fn list_members(&self, room_id: &str) -> Option<Vec<String>>;
}

/// In-memory implementation of RoomStore. The single map lock serializes
/// every mutation, which keeps each operation atomic; nothing here holds the
/// lock across an await.
pub struct InMemoryRoomStore {
    rooms: Mutex<HashMap<String, Room>>,
    id_generator: Box<dyn RoomIdGenerator>,
}

impl InMemoryRoomStore {
    pub fn new(id_generator: Box<dyn RoomIdGenerator>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            id_generator,
        }
    }

    /// Number of live rooms. Test and diagnostics helper.
    pub fn room_count(&self) -> usize {
        self.rooms.lock().unwrap().len()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    #[instrument(skip(self))]
    async fn create_room(
        &self,
        creator: ConnectionId,
        display_name: &str,
    ) -> Result<Room, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let mut room_id = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.id_generator.generate();
            if !rooms.contains_key(&candidate) {
                room_id = Some(candidate);
                break;
            }
            warn!(room_id = %candidate, "Room id collision, redrawing");
        }

        let room_id = room_id.ok_or_else(|| {
            warn!(attempts = MAX_ID_ATTEMPTS, "Room id generation exhausted");
            AppError::RoomIdSpaceExhausted
        })?;

        let mut room = Room::new(room_id.clone());
        room.add_member(creator, display_name);
        rooms.insert(room_id.clone(), room.clone());

        info!(
            room_id = %room_id,
            creator = %creator,
            display_name = %display_name,
            "Room created"
        );
        Ok(room)
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Option<Room> {
        let rooms = self.rooms.lock().unwrap();
        rooms.get(room_id).cloned()
    }

    #[instrument(skip(self))]
    async fn join_room(
        &self,
        room_id: &str,
        connection_id: ConnectionId,
        display_name: &str,
    ) -> JoinRoomResult {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Join on unknown room");
                return JoinRoomResult::RoomNotFound;
            }
        };

        room.add_member(connection_id, display_name);

        info!(
            room_id = %room_id,
            display_name = %display_name,
            member_count = room.member_count(),
            "Member joined room"
        );

        // Snapshot after the membership write; the joiner's own name showing
        // up in the list is expected.
        JoinRoomResult::Joined {
            members: room.member_names(),
            history: room.history.clone(),
            others: room.member_connections_except(connection_id),
        }
    }

    #[instrument(skip(self))]
    async fn remove_member(
        &self,
        room_id: &str,
        connection_id: ConnectionId,
    ) -> RemoveMemberResult {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Remove on unknown room");
                return RemoveMemberResult::RoomNotFound;
            }
        };

        let display_name = match room.remove_member(connection_id) {
            Some(name) => name,
            None => {
                debug!(room_id = %room_id, connection_id = %connection_id, "Not a member");
                return RemoveMemberResult::NotAMember;
            }
        };

        if room.members.is_empty() {
            rooms.remove(room_id);
            info!(room_id = %room_id, "Room emptied and deleted");
            return RemoveMemberResult::RoomDeleted { display_name };
        }

        let remaining = room.member_connections();
        info!(
            room_id = %room_id,
            display_name = %display_name,
            member_count = remaining.len(),
            "Member removed from room"
        );
        RemoveMemberResult::Removed {
            display_name,
            remaining,
        }
    }

    #[instrument(skip(self, body))]
    async fn append_message(
        &self,
        room_id: &str,
        display_name: &str,
        body: &str,
    ) -> AppendMessageResult {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Message for unknown room");
                return AppendMessageResult::RoomNotFound;
            }
        };

        let message = ChatMessage::new(display_name, body);
        room.history.push(message.clone());

        debug!(
            room_id = %room_id,
            display_name = %display_name,
            history_len = room.history.len(),
            "Message appended"
        );
        AppendMessageResult::Appended {
            message,
            recipients: room.member_connections(),
        }
    }

    #[instrument(skip(self))]
    async fn list_members(&self, room_id: &str) -> Option<Vec<String>> {
        let rooms = self.rooms.lock().unwrap();
        rooms.get(room_id).map(|room| room.member_names())
    }
}
