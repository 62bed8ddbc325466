//! Tags and message sequence numbers.

use std::fmt;
use std::num::NonZeroU32;

/// Label a command carries and its completion response echoes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag(String);

impl Tag {
    /// Wraps a tag read off the wire or produced by a [`crate::TagGenerator`].
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 1-based position of a message in the selected mailbox.
///
/// Positions shift on expunge, so a value is only good for the session
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeqNum(NonZeroU32);

impl SeqNum {
    /// `None` for 0, which IMAP never uses as a position.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// The position as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
