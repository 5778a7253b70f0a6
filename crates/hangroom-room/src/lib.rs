//! Room state for Hangroom.
//!
//! A room is a [`GameSession`]: the secret word, the guesses so far, the
//! seated players, and whose turn it is. Sessions are immutable values;
//! every transition returns a new session (or a [`GameError`] and no
//! change), which the coordinator then writes back through the
//! [`SessionStore`] with a version check.
//!
//! # Key types
//!
//! - [`GameSession`]: the hangman state machine
//! - [`SessionStore`]: versioned room storage, with [`InMemorySessionStore`]
//! - [`RoomCodeGenerator`]: short random room codes
//! - [`WordList`]: the pool secret words are drawn from
//! - [`RoomConfig`]: room settings (seats, wrong-guess limit, code shape)

mod code;
mod config;
mod error;
mod game;
mod store;
mod words;

pub use code::RoomCodeGenerator;
pub use config::RoomConfig;
pub use error::{GameError, StoreError, WordListError};
pub use game::{Departure, GameSession, GuessOutcome, Letter, Player};
pub use store::{InMemorySessionStore, SessionStore, StoredSession, Version};
pub use words::{Word, WordList};
