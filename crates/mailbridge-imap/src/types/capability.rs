//! Response status and server capabilities.

/// Status carried by a tagged or untagged status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Parses a status keyword, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "PREAUTH" => Some(Self::PreAuth),
            "BYE" => Some(Self::Bye),
            _ => None,
        }
    }

    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ => match s.get(..5) {
                Some(prefix) if prefix.eq_ignore_ascii_case("AUTH=") => {
                    Self::Auth(s.get(5..).unwrap_or_default().to_string())
                }
                _ => Self::Unknown(s.to_string()),
            },
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_ignores_case() {
        assert_eq!(Status::parse("ok"), Some(Status::Ok));
        assert_eq!(Status::parse("PreAuth"), Some(Status::PreAuth));
        assert_eq!(Status::parse("MAYBE"), None);
    }

    #[test]
    fn preauth_counts_as_ok() {
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bye.is_ok());
    }

    #[test]
    fn capability_display_round_trips_known_names() {
        for name in ["IMAP4rev1", "STARTTLS", "LOGINDISABLED", "AUTH=PLAIN"] {
            assert_eq!(Capability::parse(name).to_string(), name);
        }
    }
}
