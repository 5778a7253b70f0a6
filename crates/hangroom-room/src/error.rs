//! Error types for the room layer.

use hangroom_protocol::RoomCode;

use crate::Version;

/// Why a room operation was refused.
///
/// The `Display` text of each variant is exactly what the requesting
/// client is shown. None of these ever changes a stored session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// No room exists under the requested code.
    #[error("Room not found")]
    RoomNotFound,

    /// Every seat in the room is taken.
    #[error("Room is full")]
    RoomFull,

    /// The guess was not exactly one letter.
    #[error("Invalid guess")]
    InvalidGuess,

    /// The connection isn't seated in any room.
    #[error("Not in a game")]
    NotInGame,

    /// The room exists but isn't accepting guesses right now.
    #[error("Game not active")]
    GameNotActive,

    /// Another player holds the turn.
    #[error("Not your turn")]
    NotYourTurn,

    /// The letter was guessed earlier in this game.
    #[error("Letter already guessed")]
    AlreadyGuessed,

    /// Only the room's creator may restart it.
    #[error("Only host can start new game")]
    NotHost,

    /// The connection is already seated in a room.
    #[error("Already in a room")]
    AlreadyInRoom,

    /// No free room code was found within the attempt budget.
    #[error("Could not create a room, please try again")]
    CodeSpaceExhausted,

    /// Concurrent updates kept winning the race for this room.
    #[error("Room is busy, please try again")]
    Contention,
}

/// Errors reported by a [`SessionStore`](crate::SessionStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No session is stored under the code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// A session already exists under the code.
    #[error("room code {0} already in use")]
    RoomCodeCollision(RoomCode),

    /// The session changed since it was read.
    #[error("room {room} changed: expected version {expected}")]
    VersionConflict { room: RoomCode, expected: Version },

    /// The backing store failed for reasons of its own.
    #[error("session store failure: {0}")]
    Backend(String),
}

/// Errors building a [`WordList`](crate::WordList).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordListError {
    /// The list contained no words.
    #[error("word list is empty")]
    Empty,

    /// An entry wasn't made of ASCII letters only.
    #[error("invalid word {word:?} on line {line}")]
    InvalidWord { line: usize, word: String },
}
