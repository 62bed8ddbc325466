//! IMAP connection management.
//!
//! - TLS/plaintext stream abstraction
//! - Framed I/O for the IMAP protocol
//! - Type-state connection wrapper

mod client;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Selected};
pub use framed::{FramedStream, ResponseAccumulator};
pub use stream::{ImapStream, connect_plain, connect_tls};
