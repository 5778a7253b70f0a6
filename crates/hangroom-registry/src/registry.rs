//! The `ConnectionRegistry` port.
//!
//! The coordinator only needs a handful of keyed operations on
//! connections plus one secondary lookup ("who is in room X?"). Any store
//! offering that can back the server: the in-memory adapter in this
//! crate, or a table with a room index in a hosted database.

use std::future::Future;

use hangroom_protocol::RoomCode;
use hangroom_transport::ConnectionId;

use crate::{ConnectionRecord, RegistryError};

/// Keyed storage of [`ConnectionRecord`]s with a room membership index.
///
/// `Send + Sync + 'static` because one registry is shared by every
/// connection task, and the returned futures are `Send` so callers can
/// run them inside spawned tasks.
pub trait ConnectionRegistry: Send + Sync + 'static {
    /// Records a new connection in the lobby. Re-registering an id resets
    /// it to the lobby.
    fn register(&self, id: ConnectionId) -> impl Future<Output = ()> + Send;

    /// Moves a connection into `room` under `player_name`.
    ///
    /// Idempotent: binding to the same room and name twice is a no-op.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if the connection isn't registered.
    /// Bind never resurrects a connection that was already removed.
    fn bind(
        &self,
        id: ConnectionId,
        room: RoomCode,
        player_name: String,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;

    /// Returns the connection's current record.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if the connection isn't registered.
    fn lookup(
        &self,
        id: ConnectionId,
    ) -> impl Future<Output = Result<ConnectionRecord, RegistryError>> + Send;

    /// Lists the connections bound to `room`, in id order.
    fn members_of(&self, room: &RoomCode) -> impl Future<Output = Vec<ConnectionId>> + Send;

    /// Removes a connection, returning its last record if it existed.
    fn unregister(
        &self,
        id: ConnectionId,
    ) -> impl Future<Output = Option<ConnectionRecord>> + Send;
}
