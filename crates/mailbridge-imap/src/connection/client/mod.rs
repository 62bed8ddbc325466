//! Type-state IMAP client connection.
//!
//! The IMAP connection states are:
//!
//! - `NotAuthenticated`: Initial state after connection
//! - `Authenticated`: After successful LOGIN
//! - `Selected`: After successful SELECT
//!
//! Each state only exposes methods that are valid for that state.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    _state: PhantomData<State>,
}

// Manual Debug implementation since FramedStream doesn't implement Debug
impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Sends a CAPABILITY command and updates the stored capabilities.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let responses = self.execute(&Command::Capability).await?;
        self.absorb_capabilities(&responses);
        Ok(self.capabilities.clone())
    }

    /// Sends LOGOUT and waits for the server to close the session.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        debug!(tag = %tag, "C: LOGOUT");
        self.stream
            .write_command(&Command::Logout.serialize(&tag))
            .await?;
        self.read_until_tagged(&tag).await?;
        Ok(())
    }

    /// Sends a best-effort LOGOUT, then hands back `error`.
    pub(crate) async fn abort(self, error: Error) -> Error {
        if let Err(logout_err) = self.logout().await {
            debug!("LOGOUT after failure did not complete: {logout_err}");
        }
        error
    }

    /// Runs one command to completion and checks its tagged status.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Vec<Vec<u8>>> {
        let tag = self.tag_gen.next();
        debug!(tag = %tag, command = command.name(), "C:");
        self.stream.write_command(&command.serialize(&tag)).await?;

        let responses = self.read_until_tagged(&tag).await?;
        Self::check_tagged_ok(&responses, &tag)?;
        Ok(responses)
    }

    /// Reads responses until we get a tagged response matching our tag.
    pub(crate) async fn read_until_tagged(&mut self, tag: &str) -> Result<Vec<Vec<u8>>> {
        let mut accumulator = ResponseAccumulator::new(tag);
        accumulator.read_until_tagged(&mut self.stream).await
    }

    /// Replaces the stored capabilities with any the responses announce.
    pub(crate) fn absorb_capabilities(&mut self, responses: &[Vec<u8>]) {
        for response_bytes in responses {
            if let Ok(Response::Untagged(UntaggedResponse::Capability(caps))) =
                ResponseParser::parse(response_bytes)
            {
                self.capabilities = caps;
            }
        }
    }

    /// Checks that the tagged response is OK.
    pub(crate) fn check_tagged_ok(responses: &[Vec<u8>], tag: &str) -> Result<()> {
        let mut bye = None;
        for response_bytes in responses.iter().rev() {
            match ResponseParser::parse(response_bytes) {
                Ok(Response::Tagged {
                    tag: resp_tag,
                    status,
                    text,
                    ..
                }) if resp_tag.as_str() == tag => {
                    debug!(tag, ?status, "S: {text}");
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(()),
                        Status::No => Err(Error::No(text)),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                    };
                }
                Ok(Response::Untagged(UntaggedResponse::Bye { text, .. })) => bye = Some(text),
                _ => {}
            }
        }

        Err(bye.map_or_else(
            || Error::Protocol("missing tagged response".to_string()),
            Error::Bye,
        ))
    }

    pub(crate) fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            _state: PhantomData,
        }
    }
}
