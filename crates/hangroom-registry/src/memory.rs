//! In-memory [`ConnectionRegistry`] for a single server process.
//!
//! Two maps are kept in sync under one lock: records keyed by connection
//! id, and a room index used by `members_of`. The lock is only held for
//! map operations, never across an await.

use std::collections::{BTreeSet, HashMap};

use hangroom_protocol::RoomCode;
use hangroom_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::{ConnectionRecord, ConnectionRegistry, RegistryError};

#[derive(Debug, Default)]
struct Inner {
    /// All live connections, keyed by id.
    connections: HashMap<ConnectionId, ConnectionRecord>,

    /// Room code → connections bound to it. Lobby connections are not
    /// indexed. Empty sets are removed eagerly.
    by_room: HashMap<RoomCode, BTreeSet<ConnectionId>>,
}

impl Inner {
    fn unindex(&mut self, id: ConnectionId, room: &RoomCode) {
        if let Some(members) = self.by_room.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                self.by_room.remove(room);
            }
        }
    }
}

/// A [`ConnectionRegistry`] backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryConnectionRegistry {
    inner: Mutex<Inner>,
}

impl InMemoryConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered connections.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.connections.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.connections.is_empty()
    }
}

impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, id: ConnectionId) {
        let mut inner = self.inner.lock().await;
        let previous = inner.connections.insert(id, ConnectionRecord::in_lobby(id));
        if let Some(room) = previous.and_then(|record| record.room) {
            inner.unindex(id, &room);
        }
        tracing::debug!(%id, "connection registered");
    }

    async fn bind(
        &self,
        id: ConnectionId,
        room: RoomCode,
        player_name: String,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .connections
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;

        let previous = record.room.replace(room.clone());
        record.player_name = Some(player_name);

        if let Some(old) = previous.filter(|old| *old != room) {
            inner.unindex(id, &old);
        }
        inner.by_room.entry(room.clone()).or_default().insert(id);
        tracing::debug!(%id, %room, "connection bound to room");
        Ok(())
    }

    async fn lookup(&self, id: ConnectionId) -> Result<ConnectionRecord, RegistryError> {
        self.inner
            .lock()
            .await
            .connections
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    async fn members_of(&self, room: &RoomCode) -> Vec<ConnectionId> {
        self.inner
            .lock()
            .await
            .by_room
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn unregister(&self, id: ConnectionId) -> Option<ConnectionRecord> {
        let mut inner = self.inner.lock().await;
        let record = inner.connections.remove(&id)?;
        if let Some(room) = &record.room {
            inner.unindex(id, room);
        }
        tracing::debug!(%id, "connection unregistered");
        Some(record)
    }
}

// =========================================================================
// Tests
// =========================================================================
