//! The game session state machine.
//!
//! A [`GameSession`] is the whole state of one room. Every transition is a
//! pure function: it borrows the current session and returns a new one
//! (plus whatever the caller needs to broadcast), or a [`GameError`] with
//! the original left untouched. The coordinator retries the read, compute,
//! compare-and-swap cycle on a version conflict.
//!
//! ```text
//! waiting ──join──→ playing ──guess (word complete)──→ won
//!                    │  ↑                              │
//!                    │  └──guess (otherwise)           │
//!                    └──guess (last wrong guess)──→ lost
//! won / lost ──join (free seat) / new_game (host)──→ playing
//! ```

use std::collections::BTreeSet;
use std::fmt;

use hangroom_protocol::{GameStateView, GameStatus, PlayerView, RoomCode};
use hangroom_transport::ConnectionId;

use crate::{GameError, RoomConfig, Word, WordList};

// ---------------------------------------------------------------------------
// Letter
// ---------------------------------------------------------------------------

/// A single lower-case ASCII letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Letter(char);

impl Letter {
    /// Validates a client guess: exactly one ASCII letter, either case.
    ///
    /// # Errors
    /// [`GameError::InvalidGuess`] for anything else, including the empty
    /// string, multiple characters, digits, and non-ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, GameError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c).ok_or(GameError::InvalidGuess),
            _ => Err(GameError::InvalidGuess),
        }
    }

    /// Lower-cases `c` if it is an ASCII letter.
    pub fn from_char(c: char) -> Option<Self> {
        c.is_ascii_alphabetic().then(|| Self(c.to_ascii_lowercase()))
    }

    /// Returns the letter as a `char`.
    pub fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Player and transition outcomes
// ---------------------------------------------------------------------------

/// A seated player. Exists only inside a session's player list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub connection_id: ConnectionId,
    pub name: String,
}

impl Player {
    pub fn new(connection_id: ConnectionId, name: impl Into<String>) -> Self {
        Self {
            connection_id,
            name: name.into(),
        }
    }
}

/// What an accepted guess did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    /// The normalized letter.
    pub letter: Letter,
    /// Whether the letter is in the word.
    pub correct: bool,
    /// The secret word, present only if this guess ended the game.
    pub revealed_word: Option<Word>,
}

/// Result of removing a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// Others are still seated; persist `session` and tell them.
    Remaining { session: GameSession, player: Player },
    /// The room is now empty and should be deleted.
    Emptied { player: Player },
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// The complete state of one room.
///
/// Fields are private so that the invariants below can only be changed
/// by the transition methods:
///
/// - `players.len() <= max_players`, and never zero in a stored session
/// - `current_turn < players.len()`
/// - `wrong_guesses <= max_wrong_guesses`
/// - `status == Won` iff every letter of `word` is guessed;
///   `status == Lost` iff `wrong_guesses == max_wrong_guesses` and not won
/// - `host` never changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    room_id: RoomCode,
    word: Word,
    guessed: BTreeSet<Letter>,
    wrong_guesses: u8,
    status: GameStatus,
    players: Vec<Player>,
    current_turn: usize,
    host: ConnectionId,
    max_players: usize,
    max_wrong_guesses: u8,
}

impl GameSession {
    /// Opens a room with its creator as the only player and host.
    ///
    /// The game waits for a second player before guesses are accepted.
    pub fn create(room_id: RoomCode, host: Player, word: Word, config: &RoomConfig) -> Self {
        let session = Self {
            room_id,
            word,
            guessed: BTreeSet::new(),
            wrong_guesses: 0,
            status: GameStatus::Waiting,
            host: host.connection_id,
            players: vec![host],
            current_turn: 0,
            max_players: config.max_players.max(1),
            max_wrong_guesses: config.max_wrong_guesses.max(1),
        };
        debug_assert!(session.invariants_hold());
        session
    }

    // -- Transitions ------------------------------------------------------

    /// Seats `player` and starts play.
    ///
    /// If the previous game was already decided, a fresh word is drawn
    /// from `words` and the guess state is reset. Otherwise the game
    /// carries on where it was (e.g. a replacement for a departed player).
    ///
    /// # Errors
    /// - [`GameError::RoomFull`] if every seat is taken
    /// - [`GameError::AlreadyInRoom`] if the connection is already seated
    pub fn join(&self, player: Player, words: &WordList) -> Result<Self, GameError> {
        if self.players.len() >= self.max_players {
            return Err(GameError::RoomFull);
        }
        if self.seat_of(player.connection_id).is_some() {
            return Err(GameError::AlreadyInRoom);
        }

        let mut next = self.clone();
        next.players.push(player);
        if next.status.is_finished() {
            next.reset_round(words.pick());
        }
        next.status = GameStatus::Playing;
        debug_assert!(next.invariants_hold());
        Ok(next)
    }

    /// Applies one guess from `connection_id`.
    ///
    /// Checks run in a fixed order: letter shape, game active, turn,
    /// repeat. On success the turn always passes to the next player, even
    /// when the guess ends the game.
    ///
    /// # Errors
    /// [`GameError::InvalidGuess`], [`GameError::GameNotActive`],
    /// [`GameError::NotYourTurn`], or [`GameError::AlreadyGuessed`].
    pub fn guess(
        &self,
        connection_id: ConnectionId,
        raw_letter: &str,
    ) -> Result<(Self, GuessOutcome), GameError> {
        let letter = Letter::parse(raw_letter)?;
        if self.status != GameStatus::Playing {
            return Err(GameError::GameNotActive);
        }
        if let Some(turn_holder) = self.players.get(self.current_turn) {
            if turn_holder.connection_id != connection_id {
                return Err(GameError::NotYourTurn);
            }
        }
        if self.guessed.contains(&letter) {
            return Err(GameError::AlreadyGuessed);
        }

        let mut next = self.clone();
        next.guessed.insert(letter);
        let correct = next.word.contains(letter);
        if !correct {
            next.wrong_guesses += 1;
        }
        next.current_turn = (next.current_turn + 1) % next.players.len();
        next.status = next.settled_status();

        let revealed_word = next.status.is_finished().then(|| next.word.clone());
        debug_assert!(next.invariants_hold());
        Ok((
            next,
            GuessOutcome {
                letter,
                correct,
                revealed_word,
            },
        ))
    }

    /// Host-only restart with a fresh word. Players and host are kept.
    ///
    /// # Errors
    /// [`GameError::NotHost`] for anyone but the room's creator.
    pub fn new_game(&self, connection_id: ConnectionId, words: &WordList) -> Result<Self, GameError> {
        if connection_id != self.host {
            return Err(GameError::NotHost);
        }
        let mut next = self.clone();
        next.reset_round(words.pick());
        next.status = GameStatus::Playing;
        debug_assert!(next.invariants_hold());
        Ok(next)
    }

    /// Removes the player seated under `connection_id`.
    ///
    /// Only that exact connection is removed, so a stale disconnect
    /// can't unseat someone who came back on a new connection. The turn
    /// stays with whoever would have played next.
    ///
    /// # Errors
    /// [`GameError::NotInGame`] if the connection isn't seated here.
    pub fn leave(&self, connection_id: ConnectionId) -> Result<Departure, GameError> {
        let seat = self.seat_of(connection_id).ok_or(GameError::NotInGame)?;

        let mut next = self.clone();
        let player = next.players.remove(seat);
        if next.players.is_empty() {
            return Ok(Departure::Emptied { player });
        }
        if seat < next.current_turn {
            next.current_turn -= 1;
        }
        if next.current_turn >= next.players.len() {
            next.current_turn = 0;
        }
        debug_assert!(next.invariants_hold());
        Ok(Departure::Remaining {
            session: next,
            player,
        })
    }

    // -- Queries ----------------------------------------------------------

    pub fn room_id(&self) -> &RoomCode {
        &self.room_id
    }

    pub fn word(&self) -> &Word {
        &self.word
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn wrong_guesses(&self) -> u8 {
        self.wrong_guesses
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Guessed letters in alphabetical order.
    pub fn guessed_letters(&self) -> impl Iterator<Item = Letter> + '_ {
        self.guessed.iter().copied()
    }

    /// Looks up the player seated under `connection_id`.
    pub fn player(&self, connection_id: ConnectionId) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    /// Seated players' names in turn order.
    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    /// The word with every unguessed letter replaced by `_`.
    pub fn masked_word(&self) -> String {
        self.word
            .letters()
            .map(|l| if self.guessed.contains(&l) { l.as_char() } else { '_' })
            .collect()
    }

    /// The client-facing snapshot. The word is included only once the
    /// game is decided.
    pub fn view(&self) -> GameStateView {
        GameStateView {
            room_id: self.room_id.clone(),
            word_length: self.word.len(),
            guessed_letters: self.guessed.iter().map(|l| l.as_char()).collect(),
            wrong_guesses: self.wrong_guesses,
            masked_word: self.masked_word(),
            status: self.status,
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    name: p.name.clone(),
                    is_host: p.connection_id == self.host,
                })
                .collect(),
            current_turn: self.current_turn,
            max_wrong_guesses: self.max_wrong_guesses,
            word: self
                .status
                .is_finished()
                .then(|| self.word.as_str().to_string()),
        }
    }

    // -- Internals --------------------------------------------------------

    fn seat_of(&self, connection_id: ConnectionId) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.connection_id == connection_id)
    }

    fn reset_round(&mut self, word: Word) {
        self.word = word;
        self.guessed.clear();
        self.wrong_guesses = 0;
        self.current_turn = 0;
    }

    fn is_word_complete(&self) -> bool {
        self.word.letters().all(|l| self.guessed.contains(&l))
    }

    /// Status implied by the guess state, for a game in play.
    fn settled_status(&self) -> GameStatus {
        if self.is_word_complete() {
            GameStatus::Won
        } else if self.wrong_guesses >= self.max_wrong_guesses {
            GameStatus::Lost
        } else {
            GameStatus::Playing
        }
    }

    fn invariants_hold(&self) -> bool {
        let seats_ok = !self.players.is_empty()
            && self.players.len() <= self.max_players
            && self.current_turn < self.players.len();
        let won = self.is_word_complete();
        let lost = self.wrong_guesses >= self.max_wrong_guesses;
        let status_ok = match self.status {
            GameStatus::Won => won,
            GameStatus::Lost => lost && !won,
            GameStatus::Waiting | GameStatus::Playing => !won && !lost,
        };
        seats_ok && self.wrong_guesses <= self.max_wrong_guesses && status_ok
    }
}

// =========================================================================
// Tests
// =========================================================================
