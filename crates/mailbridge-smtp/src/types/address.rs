//! Envelope address type.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope (`MAIL FROM` / `RCPT TO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into().trim().to_string();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        // Envelope paths are written inside <...>, so these would corrupt the command line.
        if addr.chars().any(|c| matches!(c, '<' | '>' | '\r' | '\n') || c.is_whitespace()) {
            return Err(Error::InvalidAddress(format!(
                "Address contains forbidden characters: {addr}"
            )));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress("Address must contain @".into()));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(
                "Address must have exactly one @".into(),
            ));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "Local and domain parts cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
