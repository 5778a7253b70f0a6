//! The session coordinator: one inbound event, end to end.
//!
//! Every client request goes through the same steps: resolve the
//! connection's room in the registry, load the room's session, apply a
//! transition, write it back, and tell the room. The write is a
//! compare-and-swap against the version that was read; if another request
//! got there first, the whole read → apply → write cycle is repeated
//! against the fresh session, up to `max_update_attempts` times.
//!
//! ```text
//! request ──→ registry (conn → room) ──→ store.get ──→ transition
//!                                                         │
//!              router ←── store.compare_and_swap ←────────┘
//!                               │ conflict
//!                               └──→ retry from store.get
//! ```

use std::sync::Arc;

use hangroom_protocol::{ClientRequest, Codec, RoomCode, ServerEvent, decode_request};
use hangroom_registry::ConnectionRegistry;
use hangroom_room::{
    Departure, GameError, GameSession, GuessOutcome, Letter, Player, RoomCodeGenerator,
    RoomConfig, SessionStore, StoreError, WordList,
};
use hangroom_transport::{ConnectionId, Delivery};
use serde::{Deserialize, Serialize};

use crate::{BroadcastRouter, HangroomError};

/// Coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Read → apply → write cycles tried on one room before the request
    /// fails with [`GameError::Contention`].
    pub max_update_attempts: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// What to write back after a transition.
enum Commit {
    Replace(GameSession),
    Delete,
}

/// One mutation of a stored session, re-applied on every retry.
trait Transition {
    type Output;

    fn apply(&self, session: &GameSession) -> Result<(Commit, Self::Output), GameError>;
}

struct Join<'a> {
    player: Player,
    words: &'a WordList,
}

impl Transition for Join<'_> {
    type Output = GameSession;

    fn apply(&self, session: &GameSession) -> Result<(Commit, GameSession), GameError> {
        let next = session.join(self.player.clone(), self.words)?;
        Ok((Commit::Replace(next.clone()), next))
    }
}

struct Guess<'a> {
    connection_id: ConnectionId,
    letter: &'a str,
}

impl Transition for Guess<'_> {
    type Output = (GameSession, GuessOutcome);

    fn apply(
        &self,
        session: &GameSession,
    ) -> Result<(Commit, (GameSession, GuessOutcome)), GameError> {
        let (next, outcome) = session.guess(self.connection_id, self.letter)?;
        Ok((Commit::Replace(next.clone()), (next, outcome)))
    }
}

struct NewGame<'a> {
    connection_id: ConnectionId,
    words: &'a WordList,
}

impl Transition for NewGame<'_> {
    type Output = GameSession;

    fn apply(&self, session: &GameSession) -> Result<(Commit, GameSession), GameError> {
        let next = session.new_game(self.connection_id, self.words)?;
        Ok((Commit::Replace(next.clone()), next))
    }
}

struct Leave {
    connection_id: ConnectionId,
}

impl Transition for Leave {
    type Output = Departure;

    fn apply(&self, session: &GameSession) -> Result<(Commit, Departure), GameError> {
        let departure = session.leave(self.connection_id)?;
        let commit = match &departure {
            Departure::Remaining { session, .. } => Commit::Replace(session.clone()),
            Departure::Emptied { .. } => Commit::Delete,
        };
        Ok((commit, departure))
    }
}

// ---------------------------------------------------------------------------
// SessionCoordinator
// ---------------------------------------------------------------------------

/// Turns client requests and transport lifecycle events into session
/// transitions and broadcasts.
///
/// Requests for different rooms never wait on each other. Requests for
/// the same room are serialized by the store's version check: each one
/// is validated against the session it actually replaces.
pub struct SessionCoordinator<S, R, D, C> {
    store: Arc<S>,
    registry: Arc<R>,
    router: BroadcastRouter<R, D, C>,
    words: WordList,
    rooms: RoomConfig,
    codes: RoomCodeGenerator,
    config: CoordinatorConfig,
}

impl<S, R, D, C> SessionCoordinator<S, R, D, C>
where
    S: SessionStore,
    R: ConnectionRegistry,
    D: Delivery,
    C: Codec,
{
    /// Creates a coordinator with the default word list and settings.
    pub fn new(store: Arc<S>, registry: Arc<R>, delivery: Arc<D>, codec: C) -> Self {
        let rooms = RoomConfig::default();
        Self {
            router: BroadcastRouter::new(Arc::clone(&registry), delivery, codec),
            store,
            registry,
            words: WordList::default(),
            codes: RoomCodeGenerator::new(&rooms),
            rooms,
            config: CoordinatorConfig::default(),
        }
    }

    /// Sets the words new games are drawn from.
    pub fn with_words(mut self, words: WordList) -> Self {
        self.words = words;
        self
    }

    /// Sets the room settings.
    pub fn with_room_config(mut self, rooms: RoomConfig) -> Self {
        self.codes = RoomCodeGenerator::new(&rooms);
        self.rooms = rooms;
        self
    }

    /// Sets the coordinator settings.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn router(&self) -> &BroadcastRouter<R, D, C> {
        &self.router
    }

    // -- Transport lifecycle ----------------------------------------------

    /// Registers a newly accepted connection in the lobby.
    pub async fn connect(&self, connection_id: ConnectionId) {
        self.registry.register(connection_id).await;
        tracing::info!(conn_id = %connection_id, "connection opened");
    }

    /// Releases everything a closed connection held.
    ///
    /// The player is removed from their room only if that exact
    /// connection still holds the seat; the room is deleted if it empties,
    /// otherwise the others get `playerLeft`. The connection is
    /// unregistered even if leaving the room fails.
    ///
    /// # Errors
    /// Store failures while leaving the room.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Result<(), HangroomError> {
        let record = match self.registry.lookup(connection_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(conn_id = %connection_id, error = %e, "already unregistered");
                return Ok(());
            }
        };

        let departed = match &record.room {
            Some(room) => self.depart(room, connection_id).await,
            None => Ok(()),
        };
        self.registry.unregister(connection_id).await;
        tracing::info!(conn_id = %connection_id, "connection closed");
        departed
    }

    // -- Requests -----------------------------------------------------------

    /// Decodes and handles one raw inbound message.
    ///
    /// Malformed messages and unknown actions are answered with an error
    /// to the sender and never reach a session.
    ///
    /// # Errors
    /// See [`handle`](Self::handle).
    pub async fn handle_bytes(
        &self,
        connection_id: ConnectionId,
        data: &[u8],
    ) -> Result<(), HangroomError> {
        match decode_request(self.router.codec(), data) {
            Ok(request) => self.handle(connection_id, request).await,
            Err(e) => {
                tracing::debug!(conn_id = %connection_id, error = %e, "rejected request");
                self.router
                    .send_to_one(connection_id, &ServerEvent::error(e.client_message()))
                    .await?;
                Ok(())
            }
        }
    }

    /// Handles one decoded request.
    ///
    /// A request refused by the game rules is answered with an error to
    /// the sender only, and nothing is written.
    ///
    /// # Errors
    /// Infrastructure failures: the store, the registry, or encoding. The
    /// sender is not told about these.
    pub async fn handle(
        &self,
        connection_id: ConnectionId,
        request: ClientRequest,
    ) -> Result<(), HangroomError> {
        let action = request.action();
        let result = match request {
            ClientRequest::CreateRoom { player_name } => {
                self.create_room(connection_id, player_name.as_deref()).await
            }
            ClientRequest::JoinRoom {
                room_id,
                player_name,
            } => {
                self.join_room(connection_id, &room_id, player_name.as_deref())
                    .await
            }
            ClientRequest::Guess { letter } => self.guess(connection_id, &letter).await,
            ClientRequest::NewGame => self.new_game(connection_id).await,
        };

        match result {
            Err(HangroomError::Game(refusal)) => {
                tracing::debug!(conn_id = %connection_id, action, error = %refusal, "request refused");
                self.router
                    .send_to_one(connection_id, &ServerEvent::error(refusal.to_string()))
                    .await?;
                Ok(())
            }
            other => other,
        }
    }

    async fn create_room(
        &self,
        connection_id: ConnectionId,
        player_name: Option<&str>,
    ) -> Result<(), HangroomError> {
        self.ensure_in_lobby(connection_id).await?;
        let name = self
            .rooms
            .player_name(player_name, &self.rooms.default_host_name);
        let host = Player::new(connection_id, name.clone());

        // The existence check can race with another creator; the store's
        // conditional insert decides.
        let mut collisions = 0;
        let session = loop {
            let room = self
                .codes
                .generate(|code| {
                    let store = Arc::clone(&self.store);
                    // A failed check counts as taken.
                    async move { store.contains(&code).await.unwrap_or(true) }
                })
                .await?;
            let session = GameSession::create(room, host.clone(), self.words.pick(), &self.rooms);
            match self.store.create(session.clone()).await {
                Ok(_) => break session,
                Err(StoreError::RoomCodeCollision(code))
                    if collisions < self.config.max_update_attempts =>
                {
                    collisions += 1;
                    tracing::debug!(room = %code, collisions, "room code claimed concurrently");
                }
                Err(StoreError::RoomCodeCollision(_)) => {
                    return Err(GameError::CodeSpaceExhausted.into());
                }
                Err(e) => return Err(e.into()),
            }
        };
        let room = session.room_id().clone();

        if let Err(e) = self
            .registry
            .bind(connection_id, room.clone(), name.clone())
            .await
        {
            self.roll_back(&room, connection_id).await;
            return Err(e.into());
        }
        tracing::info!(conn_id = %connection_id, room = %room, player = %name, "room created");

        self.router
            .send_to_one(
                connection_id,
                &ServerEvent::RoomCreated {
                    room_id: room,
                    game_state: session.view(),
                },
            )
            .await?;
        Ok(())
    }

    async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        player_name: Option<&str>,
    ) -> Result<(), HangroomError> {
        self.ensure_in_lobby(connection_id).await?;
        let room = RoomCode::parse(room_id).ok_or(GameError::RoomNotFound)?;
        let name = self
            .rooms
            .player_name(player_name, &self.rooms.default_guest_name);

        let join = Join {
            player: Player::new(connection_id, name.clone()),
            words: &self.words,
        };
        let session = self.update(&room, join, GameError::RoomNotFound).await?;

        if let Err(e) = self
            .registry
            .bind(connection_id, room.clone(), name.clone())
            .await
        {
            self.roll_back(&room, connection_id).await;
            return Err(e.into());
        }
        tracing::info!(conn_id = %connection_id, room = %room, player = %name, "player joined");

        self.router
            .broadcast(
                &room,
                &ServerEvent::GameStarted {
                    game_state: session.view(),
                },
                None,
            )
            .await?;
        Ok(())
    }

    async fn guess(&self, connection_id: ConnectionId, letter: &str) -> Result<(), HangroomError> {
        // A malformed letter is reported before anything is looked up.
        Letter::parse(letter)?;
        let room = self.room_of(connection_id).await?;
        let guess = Guess {
            connection_id,
            letter,
        };
        let (session, outcome) = self.update(&room, guess, GameError::GameNotActive).await?;

        if let Some(word) = &outcome.revealed_word {
            tracing::info!(room = %room, status = %session.status(), %word, "game finished");
        }
        let player_name = session
            .player(connection_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();

        self.router
            .broadcast(
                &room,
                &ServerEvent::GuessResult {
                    letter: outcome.letter.as_char(),
                    correct: outcome.correct,
                    player_name,
                    game_state: session.view(),
                },
                None,
            )
            .await?;
        Ok(())
    }

    /// Restarts the requester's room. Outside a room there is nothing to
    /// restart and the request is dropped without a reply.
    async fn new_game(&self, connection_id: ConnectionId) -> Result<(), HangroomError> {
        let Some(room) = self.registry.lookup(connection_id).await?.room else {
            tracing::debug!(conn_id = %connection_id, "newGame outside a room ignored");
            return Ok(());
        };
        let new_game = NewGame {
            connection_id,
            words: &self.words,
        };
        let session = match self.update(&room, new_game, GameError::RoomNotFound).await {
            Ok(session) => session,
            Err(HangroomError::Game(GameError::RoomNotFound)) => {
                tracing::debug!(
                    conn_id = %connection_id,
                    room = %room,
                    "newGame for a vanished room ignored"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        tracing::info!(room = %room, "new game started");

        self.router
            .broadcast(
                &room,
                &ServerEvent::NewGame {
                    game_state: session.view(),
                },
                None,
            )
            .await?;
        Ok(())
    }

    // -- Internals ----------------------------------------------------------

    async fn ensure_in_lobby(&self, connection_id: ConnectionId) -> Result<(), HangroomError> {
        if self.registry.lookup(connection_id).await?.room.is_some() {
            return Err(GameError::AlreadyInRoom.into());
        }
        Ok(())
    }

    async fn room_of(&self, connection_id: ConnectionId) -> Result<RoomCode, HangroomError> {
        self.registry
            .lookup(connection_id)
            .await?
            .room
            .ok_or(HangroomError::Game(GameError::NotInGame))
    }

    /// Runs `transition` against the room until its write lands.
    ///
    /// `missing` is what the requester is told if the room doesn't exist.
    async fn update<T: Transition>(
        &self,
        room: &RoomCode,
        transition: T,
        missing: GameError,
    ) -> Result<T::Output, HangroomError> {
        for attempt in 1..=self.config.max_update_attempts {
            let stored = match self.store.get(room).await {
                Ok(stored) => stored,
                Err(StoreError::NotFound(_)) => return Err(missing.into()),
                Err(e) => return Err(e.into()),
            };

            let (commit, output) = transition.apply(&stored.session)?;
            let written = match commit {
                Commit::Replace(next) => self
                    .store
                    .compare_and_swap(room, stored.version, next)
                    .await
                    .map(drop),
                Commit::Delete => self.store.delete_if_version(room, stored.version).await,
            };

            match written {
                Ok(()) => return Ok(output),
                Err(StoreError::VersionConflict { expected, .. }) => {
                    tracing::debug!(room = %room, %expected, attempt, "room changed underneath, retrying");
                }
                Err(StoreError::NotFound(_)) => return Err(missing.into()),
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            room = %room,
            attempts = self.config.max_update_attempts,
            "room update kept conflicting"
        );
        Err(GameError::Contention.into())
    }

    /// Removes the seat held by `connection_id`, if it still holds one.
    async fn leave(
        &self,
        room: &RoomCode,
        connection_id: ConnectionId,
    ) -> Result<Option<Departure>, HangroomError> {
        match self.update(room, Leave { connection_id }, GameError::RoomNotFound).await {
            Ok(departure) => Ok(Some(departure)),
            Err(HangroomError::Game(GameError::RoomNotFound | GameError::NotInGame)) => {
                tracing::debug!(conn_id = %connection_id, room = %room, "no seat to release");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Leaves `room` and tells whoever remains.
    async fn depart(&self, room: &RoomCode, connection_id: ConnectionId) -> Result<(), HangroomError> {
        match self.leave(room, connection_id).await? {
            Some(Departure::Remaining { session, player }) => {
                tracing::info!(room = %room, player = %player.name, "player left");
                self.router
                    .broadcast(
                        room,
                        &ServerEvent::PlayerLeft {
                            player_name: player.name,
                            players: session.player_names(),
                        },
                        Some(connection_id),
                    )
                    .await?;
            }
            Some(Departure::Emptied { player }) => {
                tracing::info!(room = %room, player = %player.name, "last player left, room deleted");
            }
            None => {}
        }
        Ok(())
    }

    /// Undoes a seat whose connection vanished before it could be bound.
    async fn roll_back(&self, room: &RoomCode, connection_id: ConnectionId) {
        match self.leave(room, connection_id).await {
            Ok(_) => {
                tracing::debug!(conn_id = %connection_id, room = %room, "seat rolled back");
            }
            Err(e) => {
                tracing::warn!(conn_id = %connection_id, room = %room, error = %e, "seat rollback failed");
            }
        }
    }
}
