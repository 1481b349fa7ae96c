use thiserror::Error;

/// User input rejected before anything is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Mood must be between 1 and 5, got {0}.")]
    MoodOutOfRange(u8),

    #[error("Please provide both activity name and type.")]
    IncompleteActivity,

    #[error("Unknown activity type '{0}'.")]
    UnknownActivityType(String),

    #[error("Please write something before saving.")]
    EmptyJournal,

    #[error("Message is empty.")]
    EmptyMessage,

    #[error("Duration must be at least one minute.")]
    ZeroDuration,
}

/// Failures talking to the wellness API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session cookie is missing or expired; the caller should send the
    /// user back through login.
    #[error("You are logged out. Please log in again.")]
    Unauthorized,

    #[error("{method} {path} failed with status {status}")]
    Api {
        method: &'static str,
        path: String,
        status: u16,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion sink is closed")]
    SinkClosed,
}

impl Error {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
