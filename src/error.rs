//! Error types for the episode organizer.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the episode organizer.
#[derive(Error, Debug)]
pub enum Error {
    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Refusing to touch a path outside the working root: {0}")]
    OutsideRoot(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    // Reference list errors
    #[error("Invalid reference list: {0}")]
    InvalidReference(String),

    // Configuration errors
    #[error("Unknown naming format: {0}")]
    UnknownNamingFormat(String),

    #[error("Unknown match strategy: {0}")]
    UnknownStrategy(String),

    // Execute errors
    #[error("Execute operation failed: {0}")]
    ExecuteError(String),

    // Journal errors
    #[error("Invalid journal file: {0}")]
    InvalidJournal(String),

    #[error("No restore point found in {0}")]
    NoRestorePoint(String),

    #[error("Could not record a change in the journal, run aborted: {0}")]
    JournalWrite(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // CSV errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // TOML errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error must abort the whole operation instead of a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::OutsideRoot(_) | Error::JournalWrite(_))
    }
}
