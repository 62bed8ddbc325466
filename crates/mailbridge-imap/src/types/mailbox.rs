//! Mailbox state reported by SELECT.

/// Snapshot of a mailbox taken from the SELECT responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox (`* n EXISTS`).
    pub exists: u32,
    /// True if the server opened the mailbox `[READ-ONLY]`.
    pub read_only: bool,
}
