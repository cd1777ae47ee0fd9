use std::collections::HashSet;

use tracing::debug;

use crate::error::GameError;
use crate::MAX_TRIES;

/// Result of feeding one guess into a round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuessOutcome {
    Accepted,
    Rejected,
    AlreadyGuessed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStatus {
    InProgress,
    Won,
    Lost,
}

/// Lowercases raw input and accepts exactly one alphabetic character.
pub fn parse_guess(input: &str) -> Result<char, GameError> {
    let lowered = input.to_lowercase();
    let mut chars = lowered.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => Ok(c),
        _ => Err(GameError::InvalidGuessInput(input.to_string())),
    }
}

/// represents one word being guessed
#[derive(Debug, Clone)]
pub struct RoundState {
    word: String,
    category: String,
    guessed: HashSet<char>,
    tries_remaining: u8,
}

impl RoundState {
    pub fn start(word: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            category: category.into(),
            guessed: HashSet::new(),
            tries_remaining: MAX_TRIES,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn guessed(&self) -> &HashSet<char> {
        &self.guessed
    }

    pub fn tries_remaining(&self) -> u8 {
        self.tries_remaining
    }

    pub fn wrong_guesses(&self) -> u8 {
        MAX_TRIES - self.tries_remaining
    }

    /// Processes raw player input.
    ///
    /// Anything [`parse_guess`] refuses is rejected without touching the
    /// round.
    pub fn guess(&mut self, input: &str) -> GuessOutcome {
        let letter = match parse_guess(input) {
            Ok(letter) => letter,
            Err(e) => {
                debug!(error = %e, "guess rejected");
                return GuessOutcome::Rejected;
            }
        };

        if !self.guessed.insert(letter) {
            return GuessOutcome::AlreadyGuessed;
        }

        let hit = self.word.contains(letter);
        if !hit {
            self.tries_remaining = self.tries_remaining.saturating_sub(1);
        }
        debug!(%letter, hit, tries_remaining = self.tries_remaining, "guess accepted");

        GuessOutcome::Accepted
    }

    /// Win is checked before loss, so a final letter that also spends the
    /// last try still wins the round. An empty word can never be won.
    pub fn status(&self) -> RoundStatus {
        if self.is_solved() {
            RoundStatus::Won
        } else if self.tries_remaining == 0 {
            RoundStatus::Lost
        } else {
            RoundStatus::InProgress
        }
    }

    fn is_solved(&self) -> bool {
        !self.word.is_empty() && self.word.chars().all(|c| self.guessed.contains(&c))
    }

    /// e.g. "c _ t"
    pub fn display_mask(&self) -> String {
        self.word
            .chars()
            .map(|c| if self.guessed.contains(&c) { c } else { '_' })
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
