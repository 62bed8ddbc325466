//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::Result;
use crate::command::Command;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{MailboxStatus, ResponseCode};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox.
    ///
    /// Consumes self and returns a selected client on success. On failure
    /// the session is logged out before the error is returned.
    pub async fn select(mut self, mailbox: &str) -> Result<(Client<S, Selected>, MailboxStatus)> {
        let cmd = Command::Select {
            mailbox: mailbox.to_string(),
        };

        match self.execute(&cmd).await {
            Ok(responses) => {
                let status = parse_mailbox_status(&responses);
                Ok((self.transition(), status))
            }
            Err(err) => Err(self.abort(err).await),
        }
    }
}

/// Collects EXISTS and the access mode from SELECT responses.
fn parse_mailbox_status(responses: &[Vec<u8>]) -> MailboxStatus {
    let mut status = MailboxStatus::default();
    for response_bytes in responses {
        match ResponseParser::parse(response_bytes) {
            Ok(Response::Untagged(UntaggedResponse::Exists(n))) => status.exists = n,
            Ok(Response::Tagged {
                code: Some(ResponseCode::ReadOnly),
                ..
            }) => status.read_only = true,
            _ => {}
        }
    }
    status
}
