use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::event::{InboundEvent, OutboundEvent};
use crate::room::models::ChatMessage;

/// Wire-level event tags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    // Client -> Server
    CreateRoom,
    JoinRoom,
    SendMessage,

    // Server -> Client
    RoomCreated,
    RoomJoined,
    UserJoined,
    UserLeft,
    NewMessage,
    Error,
}

/// JSON envelope carried over the socket in both directions:
/// `{ "type": "...", "payload": ... }`. Single-string payloads (room ids,
/// display names, error text) travel as bare JSON strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEnvelope {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
}

/// Client-to-Server payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: String,
    pub message: String,
    pub display_name: String,
}

/// Server-to-Client payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedPayload {
    pub room_id: String,
    pub users: Vec<String>,
    pub messages: Vec<ChatMessage>,
}

/// Failures turning an envelope into an inbound event
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not an inbound message type: {0:?}")]
    NotInbound(MessageType),

    #[error("malformed payload for {0:?}: {1}")]
    MalformedPayload(MessageType, serde_json::Error),
}

impl WsEnvelope {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
        }
    }

    /// Decodes a client frame into the core's inbound event. `Disconnect`
    /// never arrives over the wire; the transport synthesizes it.
    pub fn into_inbound(self) -> Result<InboundEvent, DecodeError> {
        match self.message_type {
            MessageType::CreateRoom => {
                let display_name: String = serde_json::from_value(self.payload)
                    .map_err(|e| DecodeError::MalformedPayload(MessageType::CreateRoom, e))?;
                Ok(InboundEvent::CreateRoom { display_name })
            }
            MessageType::JoinRoom => {
                let payload: JoinRoomPayload = serde_json::from_value(self.payload)
                    .map_err(|e| DecodeError::MalformedPayload(MessageType::JoinRoom, e))?;
                Ok(InboundEvent::JoinRoom {
                    room_id: payload.room_id,
                    display_name: payload.display_name,
                })
            }
            MessageType::SendMessage => {
                let payload: SendMessagePayload = serde_json::from_value(self.payload)
                    .map_err(|e| DecodeError::MalformedPayload(MessageType::SendMessage, e))?;
                Ok(InboundEvent::SendMessage {
                    room_id: payload.room_id,
                    display_name: payload.display_name,
                    body: payload.message,
                })
            }
            other => Err(DecodeError::NotInbound(other)),
        }
    }

    /// Encodes a core outbound event as a wire envelope.
    pub fn from_outbound(event: &OutboundEvent) -> Self {
        match event {
            OutboundEvent::RoomCreated { room_id } => {
                Self::new(MessageType::RoomCreated, json!(room_id))
            }
            OutboundEvent::RoomJoined {
                room_id,
                users,
                messages,
            } => {
                let payload = RoomJoinedPayload {
                    room_id: room_id.clone(),
                    users: users.clone(),
                    messages: messages.clone(),
                };
                // Serializing a struct of plain strings and ChatMessages
                // cannot fail.
                Self::new(
                    MessageType::RoomJoined,
                    serde_json::to_value(payload).unwrap_or_default(),
                )
            }
            OutboundEvent::UserJoined { display_name } => {
                Self::new(MessageType::UserJoined, json!(display_name))
            }
            OutboundEvent::UserLeft { display_name } => {
                Self::new(MessageType::UserLeft, json!(display_name))
            }
            OutboundEvent::NewMessage(message) => Self::new(
                MessageType::NewMessage,
                serde_json::to_value(message).unwrap_or_default(),
            ),
            OutboundEvent::Error { message } => Self::new(MessageType::Error, json!(message)),
        }
    }
}
