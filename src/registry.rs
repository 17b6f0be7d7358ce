use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

/// Opaque identifier for one live client session, assigned by the transport
/// when the socket is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The room and display name a connection is currently bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room_id: String,
    pub display_name: String,
}

/// Maps each connection to the single room it occupies and the display name
/// it registered. A connection is bound to at most one room; rebinding
/// overwrites, and the event router is responsible for removing the
/// connection from its prior room before rebinding.
pub struct ConnectionRegistry {
    bindings: Mutex<HashMap<ConnectionId, Binding>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Records (or overwrites) the room/name association for a connection.
    pub fn bind(&self, connection_id: ConnectionId, room_id: &str, display_name: &str) {
        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            display_name = %display_name,
            "Binding connection to room"
        );
        let mut bindings = self.bindings.lock().unwrap();
        bindings.insert(
            connection_id,
            Binding {
                room_id: room_id.to_string(),
                display_name: display_name.to_string(),
            },
        );
    }

    pub fn lookup(&self, connection_id: ConnectionId) -> Option<Binding> {
        let bindings = self.bindings.lock().unwrap();
        bindings.get(&connection_id).cloned()
    }

    /// Removes and returns the prior association in one step, so disconnect
    /// handling learns which room to clean up without a separate lookup.
    pub fn unbind(&self, connection_id: ConnectionId) -> Option<Binding> {
        let mut bindings = self.bindings.lock().unwrap();
        let prior = bindings.remove(&connection_id);
        match &prior {
            Some(binding) => debug!(
                connection_id = %connection_id,
                room_id = %binding.room_id,
                "Unbound connection"
            ),
            None => debug!(connection_id = %connection_id, "Unbind on unbound connection"),
        }
        prior
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
