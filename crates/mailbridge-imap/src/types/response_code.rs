//! Bracketed response codes (`[CAPABILITY ...]`, `[READ-WRITE]`, ...).

use super::Capability;

/// Response code found in brackets at the start of response text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `[CAPABILITY ...]` sent with a greeting or a LOGIN completion.
    Capability(Vec<Capability>),
    /// `[AUTHENTICATIONFAILED]` (RFC 5530).
    AuthenticationFailed,
    /// `[READ-ONLY]`
    ReadOnly,
    /// `[READ-WRITE]`
    ReadWrite,
    /// Any other code, kept verbatim.
    Other(String),
}

impl ResponseCode {
    /// Parses the text between the brackets.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split_ascii_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_uppercase();
        match name.as_str() {
            "CAPABILITY" => Self::Capability(parts.map(Capability::parse).collect()),
            "AUTHENTICATIONFAILED" => Self::AuthenticationFailed,
            "READ-ONLY" => Self::ReadOnly,
            "READ-WRITE" => Self::ReadWrite,
            _ => Self::Other(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_code_lists_capabilities() {
        let code = ResponseCode::parse("CAPABILITY IMAP4rev1 AUTH=PLAIN");
        assert_eq!(
            code,
            ResponseCode::Capability(vec![
                Capability::Imap4Rev1,
                Capability::Auth("PLAIN".into())
            ])
        );
    }

    #[test]
    fn unknown_code_is_kept_verbatim() {
        assert_eq!(
            ResponseCode::parse("UIDVALIDITY 3857529045"),
            ResponseCode::Other("UIDVALIDITY 3857529045".into())
        );
        assert_eq!(ResponseCode::parse("read-write"), ResponseCode::ReadWrite);
    }
}
