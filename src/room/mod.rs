pub mod id;
pub mod models;
pub mod store;

pub use id::{RandomRoomIdGenerator, RoomIdGenerator};
pub use models::{ChatMessage, Member, Room};
pub use store::{
    AppendMessageResult, InMemoryRoomStore, JoinRoomResult, RemoveMemberResult, RoomStore,
};
