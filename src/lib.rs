// Library crate for the room relay server
// This file exposes the public API for integration tests

pub mod event;
pub mod registry;
pub mod room;
pub mod shared;
pub mod ws;

// Re-export commonly used types for easier access in tests
pub use event::{EventRouter, InboundEvent, OutboundDelivery, OutboundEvent};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use room::{ChatMessage, InMemoryRoomStore, RandomRoomIdGenerator, Room, RoomStore};
pub use shared::{AppError, AppState};
pub use ws::{ConnectionManager, InMemoryConnectionManager, MessageType, WsEnvelope};
