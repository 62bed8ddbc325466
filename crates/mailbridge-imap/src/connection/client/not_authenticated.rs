//! Implementation for the not-authenticated state.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::ResponseCode;
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting and any capabilities it advertises.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response().await?;
        let mut capabilities = Vec::new();
        match ResponseParser::parse(&greeting)? {
            Response::Untagged(
                UntaggedResponse::Ok { code, text } | UntaggedResponse::PreAuth { code, text },
            ) => {
                debug!("S: greeting {text}");
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            _state: PhantomData,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success. A `NO`
    /// completion becomes [`Error::Auth`] and the session is logged out.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let cmd = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.execute(&cmd).await {
            Ok(responses) => {
                self.absorb_capabilities(&responses);
                debug!(user = username, "IMAP login accepted");
                Ok(self.transition())
            }
            Err(Error::No(text)) => Err(self.abort(Error::Auth(text)).await),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Capability;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn greeting_capabilities_are_kept() {
        let mock = Builder::new()
            .read(b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] ready\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        assert!(client.has_capability(&Capability::Imap4Rev1));
    }

    #[tokio::test]
    async fn bye_greeting_is_an_error() {
        let mock = Builder::new().read(b"* BYE too many connections\r\n").build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Bye(text) if text == "too many connections"));
    }

    #[tokio::test]
    async fn login_rejection_logs_out() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0001 LOGIN user \"bad pass\"\r\n")
            .read(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .write(b"A0002 LOGOUT\r\n")
            .read(b"* BYE bye\r\nA0002 OK LOGOUT completed\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let err = client.login("user", "bad pass").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.to_string(), "Authentication failed: Invalid credentials");
    }

    #[tokio::test]
    async fn login_refreshes_capabilities() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0001 LOGIN user pass\r\n")
            .read(b"* CAPABILITY IMAP4rev2\r\nA0001 OK Logged in\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.login("user", "pass").await.unwrap();
        assert_eq!(client.capabilities(), &[Capability::Imap4Rev2]);
    }
}
