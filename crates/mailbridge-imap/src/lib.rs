//! # mailbridge-imap
//!
//! A small async IMAP client (RFC 9051 / RFC 3501 subset) for reading the
//! newest messages of a mailbox.
//!
//! ## Features
//!
//! - **Type-state connection management**: `NotAuthenticated` →
//!   `Authenticated` → `Selected`, enforced at compile time
//! - **Literal-aware framing**: `{n}` literals are read as raw bytes so
//!   message bodies survive unchanged
//! - **TLS via rustls**: implicit TLS without an OpenSSL dependency
//! - **Sans-I/O parser** for the responses the client consumes
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbridge_imap::{Client, FetchAttribute, SequenceSet};
//!
//! #[tokio::main]
//! async fn main() -> mailbridge_imap::Result<()> {
//!     let stream = mailbridge_imap::connection::connect_tls("imap.example.com", 993).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.login("user@example.com", "password").await?;
//!
//!     let (mut client, status) = client.select("INBOX").await?;
//!     println!("{} messages", status.exists);
//!
//!     let ids = client.search("ALL").await?;
//!     if let Some(&last) = ids.last() {
//!         let set = SequenceSet::from(last);
//!         for (seq, items) in client.fetch(&set, &[FetchAttribute::Rfc822]).await? {
//!             println!("{seq}: {} items", items.len());
//!         }
//!     }
//!
//!     client.logout().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── select() ──→ Selected
//!        │                              │                          │
//!        └──────────────────────── logout() ───────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, TagGenerator};
pub use connection::{
    Authenticated, Client, FramedStream, ImapStream, NotAuthenticated, ResponseAccumulator,
    Selected,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{Capability, MailboxStatus, ResponseCode, SeqNum, SequenceSet, Status, Tag};

/// Mailbox opened by default when none is named.
pub const DEFAULT_MAILBOX: &str = "INBOX";
