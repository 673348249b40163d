/// Error Module
///
/// This module defines the error types for the pumpdb crate. Every fallible
/// operation in the crate returns the shared `Result` alias so callers deal
/// with a single error enum.
use thiserror::Error;

/// Error type covering all failure modes of the crate:
/// - Connection lifecycle violations (executing while disconnected,
///   connecting twice)
/// - Database engine errors (open, statement, commit, close)
/// - Site configuration loading and parsing
/// - Settings store lookups
#[derive(Error, Debug)]
pub enum PumpDbError {
    /// Execution or connection access attempted while disconnected
    #[error("Not connected to a database")]
    NotConnected,

    /// `connect` called while a connection is already open
    #[error("Already connected to a database")]
    AlreadyConnected,

    /// Database-related errors from SQLite operations, propagated verbatim
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Site configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings store errors (unknown keys, malformed rows)
    #[error("Store error: {0}")]
    Store(String),
}

/// Type alias for Result to use PumpDbError as the error type.
pub type Result<T> = std::result::Result<T, PumpDbError>;
