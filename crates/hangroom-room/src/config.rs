//! Room configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every room on a server.
///
/// The defaults describe the classic two-player game: six wrong guesses,
/// four-letter upper-case room codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum players seated in one room.
    pub max_players: usize,

    /// Wrong guesses that lose the game.
    pub max_wrong_guesses: u8,

    /// Length of generated room codes.
    pub code_length: usize,

    /// Characters room codes are drawn from. Non-alphanumeric characters
    /// are ignored.
    pub code_alphabet: String,

    /// Collisions tolerated while generating a room code before giving up.
    pub max_code_attempts: u32,

    /// Player names longer than this are truncated.
    pub max_name_len: usize,

    /// Name used for a room creator who didn't send one.
    pub default_host_name: String,

    /// Name used for a joining player who didn't send one.
    pub default_guest_name: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: 2,
            max_wrong_guesses: 6,
            code_length: 4,
            code_alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string(),
            max_code_attempts: 32,
            max_name_len: 24,
            default_host_name: "Player 1".to_string(),
            default_guest_name: "Player 2".to_string(),
        }
    }
}

impl RoomConfig {
    /// Cleans up a client-supplied player name.
    ///
    /// Whitespace is trimmed, the result is capped at `max_name_len`
    /// characters, and a missing or blank name becomes `fallback`.
    pub fn player_name(&self, requested: Option<&str>, fallback: &str) -> String {
        let trimmed = requested.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return fallback.to_string();
        }
        trimmed.chars().take(self.max_name_len).collect()
    }
}
