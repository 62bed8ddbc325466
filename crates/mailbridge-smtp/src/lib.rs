//! # mailbridge-smtp
//!
//! Async SMTP submission client implementing the subset of RFC 5321 that
//! mailbridge needs to hand one message to a relay.
//!
//! ## Features
//!
//! - **Type-state connection management**: invalid command orderings do not
//!   compile
//! - **Security modes**: plain TCP, implicit TLS (port 465) and STARTTLS
//! - **Authentication**: PLAIN, with LOGIN as a fallback when the server does
//!   not advertise PLAIN
//! - **Graceful shutdown**: negative replies send a best-effort `QUIT` before
//!   the error is returned
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbridge_smtp::{Address, Client};
//! use mailbridge_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> mailbridge_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 587).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.ehlo("localhost").await?;
//!     let client = client.starttls("smtp.example.com").await?;
//!     let client = client.authenticate("user@example.com", "password").await?;
//!
//!     let client = client.mail_from(Address::new("user@example.com")?).await?;
//!     let client = client.rcpt_to(Address::new("friend@example.com")?).await?;
//!     let client = client.data().await?;
//!     let client = client.send_message(b"Subject: Hi\r\n\r\nHello!").await?;
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Connected ── authenticate() ──→ Authenticated ── mail_from() ──→ MailTransaction
//!                                        ↑                                │
//!                                        │                            rcpt_to()
//!                                  send_message()                         ↓
//!                                        │                          RecipientAdded
//!                                       Data ←────────── data() ──────────┘
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

pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
    SmtpStream, Upgradable,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extensions, Reply, ReplyCode};
