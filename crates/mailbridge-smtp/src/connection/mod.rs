//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded};
pub use stream::{SmtpStream, Upgradable, connect, connect_tls};

use crate::types::{AuthMechanism, Extensions};

/// What the server told us about itself.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Name from the greeting.
    pub hostname: String,
    /// Keywords from the latest EHLO.
    pub extensions: Extensions,
}

impl ServerInfo {
    /// Replaces the extensions with those of an EHLO reply.
    ///
    /// The first line is the server greeting and carries no extension.
    pub(crate) fn set_extensions(&mut self, lines: &[String]) {
        self.extensions = Extensions::from_lines(lines.iter().skip(1).map(String::as_str));
    }

    /// True if the latest EHLO listed STARTTLS.
    #[must_use]
    pub const fn supports_starttls(&self) -> bool {
        self.extensions.starttls
    }

    /// Usable mechanisms from the latest EHLO.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions.mechanisms()
    }

    /// Every mechanism name the server listed, usable or not.
    #[must_use]
    pub fn advertised_auth(&self) -> &[String] {
        self.extensions.auth.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_skip_greeting_line() {
        let lines = vec![
            "STARTTLS greets you".to_string(),
            "AUTH LOGIN CRAM-MD5".to_string(),
        ];
        let mut info = ServerInfo::default();
        info.set_extensions(&lines);

        assert!(!info.supports_starttls());
        assert_eq!(info.auth_mechanisms(), vec![AuthMechanism::Login]);
        assert_eq!(info.advertised_auth(), ["LOGIN", "CRAM-MD5"]);
    }

    #[test]
    fn nothing_advertised_by_default() {
        let info = ServerInfo::default();
        assert!(info.auth_mechanisms().is_empty());
        assert!(info.advertised_auth().is_empty());
        assert!(!info.supports_starttls());
    }
}
