//! Error types for SMTP operations.

use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server rejected the supplied credentials.
    #[error("Authentication failed: {code} {message}")]
    Authentication {
        /// Reply code (e.g., 535).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Server returned error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// Protocol error (unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns true if this error came from the authentication exchange.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns true if the connection itself failed rather than the server saying no.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Tls(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_message_names_the_stage() {
        let err = Error::Authentication {
            code: 535,
            message: "5.7.8 Bad credentials".into(),
        };
        assert_eq!(
            err.to_string(),
            "Authentication failed: 535 5.7.8 Bad credentials"
        );
        assert!(err.is_authentication());
    }

    #[test]
    fn reply_error_is_not_authentication() {
        let err = Error::smtp_error(451, "try later");
        assert!(!err.is_authentication());
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "SMTP error 451: try later");
        assert!(Error::from(io::Error::from(io::ErrorKind::BrokenPipe)).is_transport());
    }
}
