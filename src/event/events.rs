use crate::registry::ConnectionId;
use crate::room::models::ChatMessage;

/// Inbound events delivered by the transport, each tagged with the
/// connection id of the requester (carried separately by `dispatch`).
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Create a room; the creator becomes its first member.
    CreateRoom { display_name: String },

    /// Join an existing room.
    JoinRoom {
        room_id: String,
        display_name: String,
    },

    /// Relay a text message to a room.
    SendMessage {
        room_id: String,
        display_name: String,
        body: String,
    },

    /// The connection went away, cleanly or not. Synthesized by the
    /// transport; never arrives over the wire.
    Disconnect,
}

impl InboundEvent {
    /// Log label for the event kind
    pub fn event_type(&self) -> &'static str {
        match self {
            InboundEvent::CreateRoom { .. } => "create-room",
            InboundEvent::JoinRoom { .. } => "join-room",
            InboundEvent::SendMessage { .. } => "send-message",
            InboundEvent::Disconnect => "disconnect",
        }
    }
}

/// Outbound events the core hands back to the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// The requested room now exists, with the requester as first member.
    RoomCreated { room_id: String },

    /// Joined; carries the post-join membership and the full history.
    RoomJoined {
        room_id: String,
        users: Vec<String>,
        messages: Vec<ChatMessage>,
    },

    /// Someone else joined the room.
    UserJoined { display_name: String },

    /// Someone else left the room.
    UserLeft { display_name: String },

    /// A message was appended; this is the canonical stored copy.
    NewMessage(ChatMessage),

    /// The request failed; scoped to the requester.
    Error { message: String },
}

impl OutboundEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OutboundEvent::RoomCreated { .. } => "room-created",
            OutboundEvent::RoomJoined { .. } => "room-joined",
            OutboundEvent::UserJoined { .. } => "user-joined",
            OutboundEvent::UserLeft { .. } => "user-left",
            OutboundEvent::NewMessage(_) => "new-message",
            OutboundEvent::Error { .. } => "error",
        }
    }
}

/// One outbound event with its resolved fan-out set. The router computes
/// recipients at commit time, under the same lock as the state change, so
/// the set reflects the membership the mutation observed.
#[derive(Debug, Clone)]
pub struct OutboundDelivery {
    pub recipients: Vec<ConnectionId>,
    pub event: OutboundEvent,
}

impl OutboundDelivery {
    /// Delivery to a single connection
    pub fn to_connection(connection_id: ConnectionId, event: OutboundEvent) -> Self {
        Self {
            recipients: vec![connection_id],
            event,
        }
    }

    /// Delivery to an already-resolved set of connections
    pub fn to_all(recipients: Vec<ConnectionId>, event: OutboundEvent) -> Self {
        Self { recipients, event }
    }
}
