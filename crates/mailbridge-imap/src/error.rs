//! Failures of an IMAP session.

use thiserror::Error;

/// Everything that can go wrong between connecting and LOGOUT.
#[derive(Debug, Error)]
pub enum Error {
    /// The socket failed or closed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TLS layer failed.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The host cannot be used as a TLS server name.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response line did not parse.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Offset into the response.
        position: usize,
        /// What the parser expected.
        message: String,
    },

    /// LOGIN was answered with NO.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A command completed with NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// A command completed with BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// The server closed the session.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// The server sent something the client did not expect here.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// True if the server refused the credentials.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// True if the failure happened below IMAP, before any server verdict.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Tls(_) | Self::InvalidDnsName(_))
    }
}

/// Result of an IMAP operation.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(Error::Auth("Invalid credentials".into()).is_auth());
        assert!(!Error::No("Invalid credentials".into()).is_auth());
        assert!(Error::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)).is_transport());
        assert!(!Error::Bye("bye".into()).is_transport());
    }
}
