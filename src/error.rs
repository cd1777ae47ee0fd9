use thiserror::Error;

/// Errors raised by [`crate::session::GameSession`] operations.
///
/// Every variant is reported before any session state is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("you must be logged in to play")]
    NotAuthenticated,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("multiplayer needs at least 2 players, got {0}")]
    InvalidPlayerCount(usize),
    #[error("time limit of {0}s is out of range (minimum {min}s)", min = crate::timer::MIN_TIME_LIMIT_SECS)]
    InvalidTimeLimit(u64),
    /// Never returned by the session: rejected guesses are reported as
    /// [`crate::round::GuessOutcome::Rejected`].
    #[error("a guess must be a single letter, got {0:?}")]
    InvalidGuessInput(String),
    #[error("no game is running")]
    NoActiveGame,
}

/// Storage failures from the SQLite-backed collaborators and file export.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("please fill all fields")]
    MissingField,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error(
        "password must be at least {min} characters long, contain uppercase and lowercase letters, and at least one number",
        min = crate::accounts::MIN_PASSWORD_LEN
    )]
    WeakPassword,
    #[error("username '{0}' already exists")]
    UsernameTaken(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for RegisterError {
    fn from(e: rusqlite::Error) -> Self {
        RegisterError::Store(StoreError::Sqlite(e))
    }
}
