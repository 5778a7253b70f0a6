//! The `SessionStore` port and its in-memory adapter.
//!
//! Sessions are stored under their room code together with a version
//! number. Every write is conditional: `create` only inserts a new key,
//! and `compare_and_swap` / `delete_if_version` only succeed if nobody
//! else wrote the room since it was read. That is what serializes
//! concurrent guesses, joins, and leaves on the same room without any
//! lock spanning the whole operation.
//!
//! Versions are never reused, not even by a new room that draws the code
//! of a deleted one. A write holding a version read from the old room
//! always conflicts with the new one.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use hangroom_protocol::RoomCode;
use tokio::sync::RwLock;

use crate::{GameSession, StoreError};

/// Stamp of one stored write, unique across the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A session as read from the store, with the version to write against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub version: Version,
    pub session: GameSession,
}

/// Keyed storage of [`GameSession`]s with conditional writes.
///
/// Returned futures are `Send` so callers can drive them from spawned
/// connection tasks.
pub trait SessionStore: Send + Sync + 'static {
    /// Inserts a new session under its room code.
    ///
    /// # Errors
    /// [`StoreError::RoomCodeCollision`] if the code is already in use.
    fn create(
        &self,
        session: GameSession,
    ) -> impl Future<Output = Result<Version, StoreError>> + Send;

    /// Reads a session and its current version.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no session exists under `room`.
    fn get(
        &self,
        room: &RoomCode,
    ) -> impl Future<Output = Result<StoredSession, StoreError>> + Send;

    /// Returns `true` if a session exists under `room`.
    fn contains(&self, room: &RoomCode) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Replaces the session if it is still at `expected`.
    ///
    /// # Errors
    /// - [`StoreError::VersionConflict`] if it was written since
    /// - [`StoreError::NotFound`] if it was deleted since
    fn compare_and_swap(
        &self,
        room: &RoomCode,
        expected: Version,
        session: GameSession,
    ) -> impl Future<Output = Result<Version, StoreError>> + Send;

    /// Deletes the session if it is still at `expected`.
    ///
    /// # Errors
    /// Same as [`compare_and_swap`](Self::compare_and_swap).
    fn delete_if_version(
        &self,
        room: &RoomCode,
        expected: Version,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the session unconditionally. Deleting a missing room is
    /// not an error; returns whether anything was removed.
    fn delete(&self, room: &RoomCode) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// A [`SessionStore`] backed by process memory.
///
/// The map lock is only held for the map operation itself, so rooms
/// never wait on each other for longer than a hash lookup.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    rooms: RwLock<HashMap<RoomCode, StoredSession>>,
    last_version: AtomicU64,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Returns `true` if no session is stored.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Only called with the map's write lock held.
    fn next_version(&self) -> Version {
        Version(self.last_version.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: GameSession) -> Result<Version, StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = session.room_id().clone();
        if rooms.contains_key(&room) {
            return Err(StoreError::RoomCodeCollision(room));
        }
        let version = self.next_version();
        rooms.insert(room, StoredSession { version, session });
        Ok(version)
    }

    async fn get(&self, room: &RoomCode) -> Result<StoredSession, StoreError> {
        self.rooms
            .read()
            .await
            .get(room)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(room.clone()))
    }

    async fn contains(&self, room: &RoomCode) -> Result<bool, StoreError> {
        Ok(self.rooms.read().await.contains_key(room))
    }

    async fn compare_and_swap(
        &self,
        room: &RoomCode,
        expected: Version,
        session: GameSession,
    ) -> Result<Version, StoreError> {
        let mut rooms = self.rooms.write().await;
        let stored = rooms
            .get_mut(room)
            .ok_or_else(|| StoreError::NotFound(room.clone()))?;
        if stored.version != expected {
            return Err(StoreError::VersionConflict {
                room: room.clone(),
                expected,
            });
        }
        stored.version = self.next_version();
        stored.session = session;
        Ok(stored.version)
    }

    async fn delete_if_version(&self, room: &RoomCode, expected: Version) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().await;
        let stored = rooms
            .get(room)
            .ok_or_else(|| StoreError::NotFound(room.clone()))?;
        if stored.version != expected {
            return Err(StoreError::VersionConflict {
                room: room.clone(),
                expected,
            });
        }
        rooms.remove(room);
        Ok(())
    }

    async fn delete(&self, room: &RoomCode) -> Result<bool, StoreError> {
        Ok(self.rooms.write().await.remove(room).is_some())
    }
}
