//! Error types for the core library.

use thiserror::Error;

use crate::profile::ValidationError;

/// Errors returned by [`crate::ProfileStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A profile with this name already exists.
    #[error("Profile '{0}' already exists")]
    DuplicateName(String),

    /// No profile with this name exists.
    #[error("Profile '{0}' not found")]
    NotFound(String),

    /// The profile failed validation; nothing was written.
    #[error("Invalid profile: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Why sending a message failed.
#[derive(Debug, Error)]
pub enum SendFailure {
    /// The server rejected the credentials.
    #[error(transparent)]
    Authentication(mailbridge_smtp::Error),

    /// The server could not be reached or the connection broke.
    #[error(transparent)]
    Connection(mailbridge_smtp::Error),

    /// The server refused a step of the dialogue or spoke out of turn.
    #[error(transparent)]
    Protocol(mailbridge_smtp::Error),
}

impl From<mailbridge_smtp::Error> for SendFailure {
    fn from(err: mailbridge_smtp::Error) -> Self {
        if err.is_authentication() {
            Self::Authentication(err)
        } else if err.is_transport() {
            Self::Connection(err)
        } else {
            Self::Protocol(err)
        }
    }
}

/// Why reading messages failed.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// The server rejected the credentials.
    #[error(transparent)]
    Authentication(mailbridge_imap::Error),

    /// The server could not be reached or the connection broke.
    #[error(transparent)]
    Connection(mailbridge_imap::Error),

    /// The server refused a command or sent something unparsable.
    #[error(transparent)]
    Protocol(mailbridge_imap::Error),

    /// A message body was not valid UTF-8.
    #[error("Message {seq} is not valid UTF-8: {source}")]
    Decode {
        /// Sequence number of the offending message.
        seq: u32,
        /// Underlying decode error.
        source: std::string::FromUtf8Error,
    },
}

impl From<mailbridge_imap::Error> for FetchFailure {
    fn from(err: mailbridge_imap::Error) -> Self {
        if err.is_auth() {
            Self::Authentication(err)
        } else if err.is_transport() {
            Self::Connection(err)
        } else {
            Self::Protocol(err)
        }
    }
}
