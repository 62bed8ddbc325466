//! # mailbridge-core
//!
//! Core logic for mailbridge, a tool server that lets an agent send and read
//! email through named account profiles.
//!
//! This crate provides:
//! - **Profiles** - [`MailProfile`] records kept in a `SQLite`-backed [`ProfileStore`]
//! - **Sessions** - one-shot SMTP submission and IMAP reading behind the
//!   [`OutboundSession`] and [`InboundSession`] traits
//! - **Tools** - decoding of tool invocations into [`ToolCall`]s
//! - **Dispatch** - a [`Dispatcher`] that turns every call into a [`ToolOutput`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod dispatch;
mod error;
pub mod profile;
pub mod report;
pub mod session;
pub mod tool;

pub use dispatch::{Dispatcher, ToolOutput};
pub use error::{FetchFailure, Result, SendFailure, StoreError};
pub use profile::{
    InboundConfig, InboundSecurity, MailProfile, OutboundConfig, OutboundSecurity, ProfileStore,
    ProfileUpdate, ValidationError, validate_profile,
};
pub use report::{Reporter, TracingReporter};
pub use session::{
    ImapInbound, InboundSession, OutboundSession, OutgoingMessage, SmtpOutbound, TcpConnector,
};
pub use tool::{ToolCall, ToolCallError};
