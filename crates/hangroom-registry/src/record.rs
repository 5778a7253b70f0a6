//! The registry's record of one live connection.

use hangroom_protocol::RoomCode;
use hangroom_transport::ConnectionId;

/// Where a connection is and what it calls itself.
///
/// A freshly registered connection sits in the lobby (`room == None`)
/// with no name. Creating or joining a room binds both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// The transport-assigned connection id.
    pub id: ConnectionId,

    /// The room this connection plays in, or `None` for the lobby.
    pub room: Option<RoomCode>,

    /// Display name chosen when entering a room.
    pub player_name: Option<String>,
}

impl ConnectionRecord {
    /// A new record parked in the lobby.
    pub fn in_lobby(id: ConnectionId) -> Self {
        Self {
            id,
            room: None,
            player_name: None,
        }
    }

    /// Returns `true` if the connection is not in any room.
    pub fn is_in_lobby(&self) -> bool {
        self.room.is_none()
    }
}
