//! SMTP command builder.

use crate::types::{Address, AuthMechanism};

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH - Begin authentication
    Auth {
        /// Authentication mechanism
        mechanism: AuthMechanism,
        /// Initial response (optional, for SASL-IR)
        initial_response: Option<String>,
    },
    /// Continuation line of a SASL exchange (base64 payload only)
    AuthResponse(String),
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: Address,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Self::Ehlo { hostname } => {
                buf.extend_from_slice(b"EHLO ");
                buf.extend_from_slice(hostname.as_bytes());
            }
            Self::StartTls => {
                buf.extend_from_slice(b"STARTTLS");
            }
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTH ");
                buf.extend_from_slice(mechanism.as_str().as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }
            Self::AuthResponse(payload) => {
                buf.extend_from_slice(payload.as_bytes());
            }
            Self::MailFrom { from } => {
                buf.extend_from_slice(b"MAIL FROM:<");
                buf.extend_from_slice(from.as_str().as_bytes());
                buf.push(b'>');
            }
            Self::RcptTo { to } => {
                buf.extend_from_slice(b"RCPT TO:<");
                buf.extend_from_slice(to.as_str().as_bytes());
                buf.push(b'>');
            }
            Self::Data => {
                buf.extend_from_slice(b"DATA");
            }
            Self::Quit => {
                buf.extend_from_slice(b"QUIT");
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns a form of the command that is safe to log.
    ///
    /// Credentials carried by AUTH exchanges are masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Auth { mechanism, .. } => format!("AUTH {} ***", mechanism.as_str()),
            Self::AuthResponse(_) => "***".to_string(),
            other => String::from_utf8_lossy(&other.serialize())
                .trim_end()
                .to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ehlo_command() {
        let cmd = Command::Ehlo {
            hostname: "client.example.com".to_string(),
        };
        assert_eq!(cmd.serialize(), b"EHLO client.example.com\r\n");
    }

    #[test]
    fn test_auth_plain() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
    }

    #[test]
    fn test_auth_login_without_initial_response() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        assert_eq!(cmd.serialize(), b"AUTH LOGIN\r\n");
        assert_eq!(
            Command::AuthResponse("dXNlcg==".into()).serialize(),
            b"dXNlcg==\r\n"
        );
    }

    #[test]
    fn test_envelope_commands() {
        let from = Command::MailFrom {
            from: Address::new("sender@example.com").unwrap(),
        };
        let to = Command::RcptTo {
            to: Address::new("recipient@example.com").unwrap(),
        };
        assert_eq!(from.serialize(), b"MAIL FROM:<sender@example.com>\r\n");
        assert_eq!(to.serialize(), b"RCPT TO:<recipient@example.com>\r\n");
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::StartTls.serialize(), b"STARTTLS\r\n");
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn test_redacted_hides_credentials() {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some("AHVzZXIAcGFzcw==".to_string()),
        };
        assert_eq!(cmd.redacted(), "AUTH PLAIN ***");
        assert_eq!(Command::AuthResponse("c2VjcmV0".into()).redacted(), "***");
        assert_eq!(Command::Quit.redacted(), "QUIT");
    }
}
