//! IMAP command builder.
//!
//! Commands are serialized with their tag and the trailing CRLF, ready to be
//! written to the stream.

mod serialize;
mod tag_generator;

use crate::types::SequenceSet;

pub use tag_generator::TagGenerator;

use serialize::{write_astring, write_fetch_attributes};

/// Message data item requested by FETCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchAttribute {
    /// The complete raw message (`RFC822`).
    Rfc822,
    /// Size of the raw message in octets (`RFC822.SIZE`).
    Rfc822Size,
    /// Unique identifier (`UID`).
    Uid,
}

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITY command.
    Capability,
    /// LOGOUT command.
    Logout,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },
    /// SEARCH command.
    Search {
        /// Search key, e.g. `ALL`.
        criteria: String,
    },
    /// FETCH command.
    Fetch {
        /// Messages to fetch.
        sequence: SequenceSet,
        /// Data items to return.
        items: Vec<FetchAttribute>,
    },
}

impl Command {
    /// Serializes the command with the given tag.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_astring(&mut buf, mailbox);
            }
            Self::Search { criteria } => {
                buf.extend_from_slice(b"SEARCH ");
                buf.extend_from_slice(criteria.as_bytes());
            }
            Self::Fetch { sequence, items } => {
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_attributes(&mut buf, items);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns the command name, safe to log.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::Search { .. } => "SEARCH",
            Self::Fetch { .. } => "FETCH",
        }
    }
}
