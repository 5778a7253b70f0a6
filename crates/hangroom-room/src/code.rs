//! Room code generation.

use std::future::Future;

use hangroom_protocol::RoomCode;
use rand::Rng;

use crate::{GameError, RoomConfig};

/// Draws short random room codes, skipping ones already in use.
#[derive(Debug, Clone)]
pub struct RoomCodeGenerator {
    alphabet: Vec<char>,
    length: usize,
    max_attempts: u32,
}

impl RoomCodeGenerator {
    /// Builds a generator from the room configuration.
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            alphabet: config
                .code_alphabet
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect(),
            length: config.code_length,
            max_attempts: config.max_code_attempts,
        }
    }

    /// Returns one random code, or `None` if the configured alphabet or
    /// length can't produce a valid code.
    pub fn candidate(&self) -> Option<RoomCode> {
        if self.alphabet.is_empty() {
            return None;
        }
        let mut rng = rand::rng();
        let code: String = (0..self.length)
            .map(|_| self.alphabet[rng.random_range(0..self.alphabet.len())])
            .collect();
        RoomCode::parse(&code)
    }

    /// Draws codes until `exists` reports one free.
    ///
    /// `exists` is the uniqueness check against the session store. A free
    /// code can still be taken by a concurrent creator before it's used,
    /// so the store's conditional insert has the final word.
    ///
    /// # Errors
    /// [`GameError::CodeSpaceExhausted`] after `max_code_attempts` draws
    /// without a free code.
    pub async fn generate<F, Fut>(&self, mut exists: F) -> Result<RoomCode, GameError>
    where
        F: FnMut(RoomCode) -> Fut,
        Fut: Future<Output = bool>,
    {
        for attempt in 1..=self.max_attempts {
            let Some(code) = self.candidate() else {
                break;
            };
            if !exists(code.clone()).await {
                return Ok(code);
            }
            tracing::debug!(%code, attempt, "room code taken, redrawing");
        }
        tracing::warn!(
            attempts = self.max_attempts,
            "no free room code found"
        );
        Err(GameError::CodeSpaceExhausted)
    }
}

impl Default for RoomCodeGenerator {
    fn default() -> Self {
        Self::new(&RoomConfig::default())
    }
}
