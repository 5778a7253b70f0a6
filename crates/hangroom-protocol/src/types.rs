//! Core protocol types for Hangroom's wire format.
//!
//! Every type here travels "on the wire": clients send [`ClientRequest`]s
//! and receive [`ServerEvent`]s, both as JSON objects tagged by an
//! `action` field with camelCase keys.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Longest room code accepted from a client.
const MAX_ROOM_CODE_LEN: usize = 16;

/// The short code that identifies a room, e.g. `"QXZB"`.
///
/// Codes are upper-case ASCII alphanumerics. [`RoomCode::parse`] is the
/// only way to build one, so a `RoomCode` is always normalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes client input into a room code.
    ///
    /// Surrounding whitespace is ignored and letters are upper-cased.
    /// Returns `None` for empty, over-long, or non-alphanumeric input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.len() > MAX_ROOM_CODE_LEN
            || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game state as clients see it
// ---------------------------------------------------------------------------

/// Lifecycle status of a room's game.
///
/// ```text
/// waiting ──(2nd player joins)──→ playing ──(word complete)──→ won
///                                    │
///                                    └──(6th wrong guess)──→ lost
/// won / lost ──(join into free slot, or host new game)──→ playing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    /// Returns `true` once the game has been decided.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

/// A player as listed in [`GameStateView::players`].
///
/// Transport identifiers are deliberately absent; list position is the
/// turn order that [`GameStateView::current_turn`] indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub name: String,
    pub is_host: bool,
}

/// The sanitized game state sent to every participant.
///
/// The secret word only appears in `word` once the game is won or lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub room_id: RoomCode,
    pub word_length: usize,
    /// Guessed letters in alphabetical order.
    pub guessed_letters: Vec<char>,
    pub wrong_guesses: u8,
    /// One character per word position: the letter if guessed, else `_`.
    pub masked_word: String,
    pub status: GameStatus,
    pub players: Vec<PlayerView>,
    pub current_turn: usize,
    pub max_wrong_guesses: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
}

// ---------------------------------------------------------------------------
// ClientRequest: client → server
// ---------------------------------------------------------------------------

/// An action requested by a client.
///
/// Internally tagged by `action`, so a guess looks like
/// `{ "action": "guess", "letter": "e" }`. Optional fields may be omitted;
/// validation happens in the game layer, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientRequest {
    /// Open a new room and become its host.
    CreateRoom {
        #[serde(default)]
        player_name: Option<String>,
    },

    /// Take the free seat in an existing room.
    JoinRoom {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        player_name: Option<String>,
    },

    /// Guess one letter. Anything but a single letter is rejected later.
    Guess {
        #[serde(default)]
        letter: String,
    },

    /// Host-only: restart the room with a fresh word.
    NewGame,
}

impl ClientRequest {
    /// Every `action` value this protocol understands.
    pub const ACTIONS: [&'static str; 4] = ["createRoom", "joinRoom", "guess", "newGame"];

    /// The wire name of this request's action.
    pub fn action(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "createRoom",
            Self::JoinRoom { .. } => "joinRoom",
            Self::Guess { .. } => "guess",
            Self::NewGame => "newGame",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent: server → client
// ---------------------------------------------------------------------------

/// A message pushed by the server, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// To the creator only: the room exists and they are its host.
    RoomCreated {
        room_id: RoomCode,
        game_state: GameStateView,
    },

    /// To the room: a second player joined and the game is on.
    GameStarted { game_state: GameStateView },

    /// To the room: a guess was accepted.
    GuessResult {
        letter: char,
        correct: bool,
        player_name: String,
        game_state: GameStateView,
    },

    /// To the room: the host restarted the game.
    NewGame { game_state: GameStateView },

    /// To the remaining players: someone disconnected.
    PlayerLeft {
        player_name: String,
        players: Vec<String>,
    },

    /// To the requester only: the request was rejected.
    Error { message: String },
}

impl ServerEvent {
    /// Shorthand for an [`ServerEvent::Error`] with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
