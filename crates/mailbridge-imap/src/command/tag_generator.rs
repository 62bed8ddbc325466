//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

/// Tag generator for IMAP commands.
///
/// Generates sequential tags in the format "A0001", "A0002", etc.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Generates the next tag.
    pub fn next(&mut self) -> String {
        self.counter = self.counter.wrapping_add(1);
        format!("{}{:04}", self.prefix, self.counter)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}
