//! Secret words and the list they're drawn from.

use std::fmt;

use rand::Rng;

use crate::{Letter, WordListError};

/// Words used when no list is configured.
const DEFAULT_WORDS: [&str; 24] = [
    "python",
    "hangman",
    "programming",
    "computer",
    "keyboard",
    "developer",
    "algorithm",
    "function",
    "variable",
    "software",
    "terminal",
    "debugging",
    "interface",
    "database",
    "network",
    "javascript",
    "frontend",
    "backend",
    "multiplayer",
    "websocket",
    "lambda",
    "server",
    "client",
    "browser",
];

/// A secret word: one or more lower-case ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word(String);

impl Word {
    /// Normalizes `raw` into a word. Returns `None` unless, after
    /// trimming, it is non-empty and made of ASCII letters only.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the word as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of letters in the word.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a `Word` can't be empty. Present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the letter appears anywhere in the word.
    pub fn contains(&self, letter: Letter) -> bool {
        self.0.contains(letter.as_char())
    }

    /// The word's letters in order, repeats included.
    pub fn letters(&self) -> impl Iterator<Item = Letter> + '_ {
        self.0.chars().filter_map(Letter::from_char)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-empty pool of words that games draw from uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordList {
    words: Vec<Word>,
}

impl WordList {
    /// Builds a list from individual words.
    ///
    /// # Errors
    /// [`WordListError::InvalidWord`] for an entry that isn't all letters,
    /// [`WordListError::Empty`] if nothing was given.
    pub fn new<'a>(words: impl IntoIterator<Item = &'a str>) -> Result<Self, WordListError> {
        let words = words
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                Word::parse(raw).ok_or_else(|| WordListError::InvalidWord {
                    line: i + 1,
                    word: raw.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if words.is_empty() {
            return Err(WordListError::Empty);
        }
        Ok(Self { words })
    }

    /// Parses a newline-separated word file.
    ///
    /// Blank lines and lines starting with `#` are skipped. Line numbers
    /// in errors refer to the original text.
    pub fn parse(text: &str) -> Result<Self, WordListError> {
        let mut words = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let word = Word::parse(line).ok_or_else(|| WordListError::InvalidWord {
                line: i + 1,
                word: line.to_string(),
            })?;
            words.push(word);
        }
        if words.is_empty() {
            return Err(WordListError::Empty);
        }
        Ok(Self { words })
    }

    /// Picks a word uniformly at random.
    pub fn pick(&self) -> Word {
        let index = rand::rng().random_range(0..self.words.len());
        self.words[index].clone()
    }

    /// Number of words in the list.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; a `WordList` can't be empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterates over the words in list order.
    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }
}

impl Default for WordList {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| Word(w.to_string())).collect(),
        }
    }
}
