pub mod connection_manager;
pub mod handler;
pub mod messages;
pub mod socket;

pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, RelayFrameHandler};
pub use messages::{MessageType, WsEnvelope};
pub use socket::{Connection, FrameHandler, SocketWrapper};
