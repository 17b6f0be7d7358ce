use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::events::{InboundEvent, OutboundDelivery, OutboundEvent};
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::room::store::{
    AppendMessageResult, JoinRoomResult, RemoveMemberResult, RoomStore,
};
use crate::shared::AppError;

const ROOM_NOT_FOUND: &str = "Room not found";

/// The core's public contract: receives inbound events from the transport,
/// mutates the room store and connection registry, and returns targeted
/// outbound deliveries. Holds no sockets and performs no I/O, so it is
/// testable without a live transport.
///
/// Per-connection ordering is the transport's job (each socket's read loop
/// dispatches one event to completion before reading the next); per-room
/// atomicity is the store's.
pub struct EventRouter {
    room_store: Arc<dyn RoomStore>,
    registry: Arc<ConnectionRegistry>,
}

impl EventRouter {
    pub fn new(room_store: Arc<dyn RoomStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            room_store,
            registry,
        }
    }

    /// Dispatches one inbound event for one connection.
    #[instrument(skip(self, event), fields(event_type = event.event_type()))]
    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        event: InboundEvent,
    ) -> Result<Vec<OutboundDelivery>, AppError> {
        match event {
            InboundEvent::CreateRoom { display_name } => {
                self.handle_create_room(connection_id, &display_name).await
            }
            InboundEvent::JoinRoom {
                room_id,
                display_name,
            } => {
                self.handle_join_room(connection_id, &room_id, &display_name)
                    .await
            }
            InboundEvent::SendMessage {
                room_id,
                display_name,
                body,
            } => {
                self.handle_send_message(connection_id, &room_id, &display_name, &body)
                    .await
            }
            InboundEvent::Disconnect => self.handle_disconnect(connection_id).await,
        }
    }

    /// Removes the connection from the room it currently occupies, if that
    /// room differs from the one it is moving to. A connection holds at most
    /// one membership; create/join must run this before rebinding so the
    /// prior room never keeps a stale member.
    async fn leave_prior_room(
        &self,
        connection_id: ConnectionId,
        new_room_id: &str,
    ) -> Vec<OutboundDelivery> {
        let binding = match self.registry.lookup(connection_id) {
            Some(binding) if binding.room_id != new_room_id => binding,
            _ => return Vec::new(),
        };

        info!(
            connection_id = %connection_id,
            prior_room_id = %binding.room_id,
            new_room_id = %new_room_id,
            "Connection moving rooms, leaving prior room"
        );

        match self
            .room_store
            .remove_member(&binding.room_id, connection_id)
            .await
        {
            RemoveMemberResult::Removed {
                display_name,
                remaining,
            } => vec![OutboundDelivery::to_all(
                remaining,
                OutboundEvent::UserLeft { display_name },
            )],
            RemoveMemberResult::RoomDeleted { .. } => Vec::new(),
            RemoveMemberResult::NotAMember | RemoveMemberResult::RoomNotFound => {
                warn!(
                    room_id = %binding.room_id,
                    connection_id = %connection_id,
                    "Prior-room cleanup found no membership"
                );
                Vec::new()
            }
        }
    }

    async fn handle_create_room(
        &self,
        connection_id: ConnectionId,
        display_name: &str,
    ) -> Result<Vec<OutboundDelivery>, AppError> {
        let room = match self.room_store.create_room(connection_id, display_name).await {
            Ok(room) => room,
            Err(AppError::RoomIdSpaceExhausted) => {
                // Fatal to this request only; the requester gets an error
                // event and the process carries on. The connection keeps
                // whatever room it already had.
                warn!(connection_id = %connection_id, "Room creation failed: id space exhausted");
                return Ok(vec![OutboundDelivery::to_connection(
                    connection_id,
                    OutboundEvent::Error {
                        message: AppError::RoomIdSpaceExhausted.to_string(),
                    },
                )]);
            }
            Err(e) => return Err(e),
        };

        let mut deliveries = self.leave_prior_room(connection_id, &room.id).await;
        self.registry.bind(connection_id, &room.id, display_name);

        info!(
            room_id = %room.id,
            display_name = %display_name,
            "Room created and creator joined"
        );
        deliveries.push(OutboundDelivery::to_connection(
            connection_id,
            OutboundEvent::RoomCreated { room_id: room.id },
        ));
        Ok(deliveries)
    }

    async fn handle_join_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        display_name: &str,
    ) -> Result<Vec<OutboundDelivery>, AppError> {
        match self
            .room_store
            .join_room(room_id, connection_id, display_name)
            .await
        {
            JoinRoomResult::Joined {
                members,
                history,
                others,
            } => {
                // The join succeeded, so it is now safe to drop the prior
                // membership; a rejected join leaves it untouched.
                let mut deliveries = self.leave_prior_room(connection_id, room_id).await;
                self.registry.bind(connection_id, room_id, display_name);

                info!(room_id = %room_id, display_name = %display_name, "Connection joined room");
                deliveries.push(OutboundDelivery::to_all(
                    others,
                    OutboundEvent::UserJoined {
                        display_name: display_name.to_string(),
                    },
                ));
                deliveries.push(OutboundDelivery::to_connection(
                    connection_id,
                    OutboundEvent::RoomJoined {
                        room_id: room_id.to_string(),
                        users: members,
                        messages: history,
                    },
                ));
                Ok(deliveries)
            }
            JoinRoomResult::RoomNotFound => {
                debug!(room_id = %room_id, "Join rejected: room not found");
                Ok(vec![OutboundDelivery::to_connection(
                    connection_id,
                    OutboundEvent::Error {
                        message: ROOM_NOT_FOUND.to_string(),
                    },
                )])
            }
        }
    }

    async fn handle_send_message(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        display_name: &str,
        body: &str,
    ) -> Result<Vec<OutboundDelivery>, AppError> {
        match self
            .room_store
            .append_message(room_id, display_name, body)
            .await
        {
            AppendMessageResult::Appended {
                message,
                recipients,
            } => {
                // The sender is in the fan-out set: its UI shows the stored
                // copy, not a local echo.
                Ok(vec![OutboundDelivery::to_all(
                    recipients,
                    OutboundEvent::NewMessage(message),
                )])
            }
            AppendMessageResult::RoomNotFound => {
                // The original relay dropped these silently; surfacing an
                // error keeps send symmetric with join.
                debug!(room_id = %room_id, "Message rejected: room not found");
                Ok(vec![OutboundDelivery::to_connection(
                    connection_id,
                    OutboundEvent::Error {
                        message: ROOM_NOT_FOUND.to_string(),
                    },
                )])
            }
        }
    }

    async fn handle_disconnect(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Vec<OutboundDelivery>, AppError> {
        let binding = match self.registry.unbind(connection_id) {
            Some(binding) => binding,
            None => {
                debug!(connection_id = %connection_id, "Disconnect for unbound connection");
                return Ok(Vec::new());
            }
        };

        match self
            .room_store
            .remove_member(&binding.room_id, connection_id)
            .await
        {
            RemoveMemberResult::Removed {
                display_name,
                remaining,
            } => {
                info!(
                    room_id = %binding.room_id,
                    display_name = %display_name,
                    "Member disconnected, notifying remaining members"
                );
                Ok(vec![OutboundDelivery::to_all(
                    remaining,
                    OutboundEvent::UserLeft { display_name },
                )])
            }
            RemoveMemberResult::RoomDeleted { display_name } => {
                info!(
                    room_id = %binding.room_id,
                    display_name = %display_name,
                    "Last member disconnected, room deleted"
                );
                Ok(Vec::new())
            }
            RemoveMemberResult::NotAMember | RemoveMemberResult::RoomNotFound => {
                // Registry said the connection was bound here but the room
                // disagrees; nothing left to clean up.
                warn!(
                    room_id = %binding.room_id,
                    connection_id = %connection_id,
                    "Disconnect cleanup found no membership"
                );
                Ok(Vec::new())
            }
        }
    }
}
