//! Server replies.

/// Three-digit reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220, greeting and STARTTLS go-ahead.
    pub const SERVICE_READY: Self = Self(220);
    /// 221, answer to QUIT.
    pub const CLOSING: Self = Self(221);
    /// 235, AUTH accepted.
    pub const AUTH_SUCCEEDED: Self = Self(235);
    /// 334, server wants the next SASL step.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354, send the message text.
    pub const START_DATA: Self = Self(354);

    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// The numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// True for 2xx.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 / 100 == 2
    }
}

/// A complete reply. Multi-line replies keep one entry per line, without
/// the code prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Code shared by every line.
    pub code: ReplyCode,
    /// Text of each line.
    pub message: Vec<String>,
}

impl Reply {
    /// Builds a reply from its code and line texts.
    #[must_use]
    pub const fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// True for 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// All lines joined with spaces, for error messages.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join(" ")
    }

    /// First word of the first line; in a greeting this is the server name.
    #[must_use]
    pub fn first_word(&self) -> Option<&str> {
        self.message.first()?.split_whitespace().next()
    }
}
