//! Error types for the note layer.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur in note operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network, TLS or greeting failure. The connection is unusable.
    #[error("Connection failed: {0}")]
    Transport(inotes_imap::Error),

    /// A command was refused, or the server sent data we cannot use.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A stored message could not be decoded as a note.
    #[error("Cannot decode note: {0}")]
    Parse(String),

    /// The note was rejected before anything was sent.
    #[error("Invalid note: {0}")]
    InvalidNote(String),
}

impl Error {
    /// Returns true if the connection that produced this error is gone.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<inotes_imap::Error> for Error {
    fn from(error: inotes_imap::Error) -> Self {
        if error.is_transport() {
            Self::Transport(error)
        } else {
            Self::Protocol(error.to_string())
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
