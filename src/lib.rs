// Library surface for the binary, headless drivers and integration tests.
// Game rules live in round/turns/timer/session; storage and UI sit around them.
pub mod accounts;
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod round;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod turns;
pub mod ui;
pub mod words;

/// Wrong guesses allowed per round
pub const MAX_TRIES: u8 = 6;

pub const TICK_RATE_MS: u64 = 100;

pub use error::{GameError, RegisterError, StoreError};
pub use session::{GameSession, GameSummary, GuessReport, Mode, Transition};
