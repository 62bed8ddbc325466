//! Type-state SMTP client.

use super::{ServerInfo, Upgradable};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io;
use std::marker::PhantomData;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
///
/// `S` is the transport; production code uses [`super::SmtpStream`], tests use
/// scripted in-memory streams.
#[derive(Debug)]
pub struct Client<S, State> {
    stream: BufReader<S>,
    server_info: ServerInfo,
    ehlo_name: String,
    _state: PhantomData<State>,
}

impl<S> Client<S, Connected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut stream = BufReader::new(stream);
        let greeting = read_reply(&mut stream).await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::smtp_error(
                greeting.code.as_u16(),
                greeting.message_text(),
            ));
        }

        let hostname = greeting.first_word().unwrap_or("unknown").to_string();
        debug!(server = %hostname, "SMTP greeting received");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                ..ServerInfo::default()
            },
            ehlo_name: String::new(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        self.ehlo_name = client_hostname.to_string();
        self.refresh_extensions().await
    }

    /// Authenticates with the best mechanism both sides support.
    ///
    /// PLAIN is used when the server advertises it or advertises nothing;
    /// LOGIN is the fallback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] if the server rejects the
    /// credentials, or [`Error::NotSupported`] if no usable mechanism exists.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let mechanisms = self.server_info.auth_mechanisms();
        if self.server_info.advertised_auth().is_empty()
            || mechanisms.contains(&AuthMechanism::Plain)
        {
            self.auth_plain(username, password).await
        } else if mechanisms.contains(&AuthMechanism::Login) {
            self.auth_login(username, password).await
        } else {
            let offered = self.server_info.advertised_auth().join(", ");
            Err(self
                .abort(Error::NotSupported(format!(
                    "AUTH PLAIN or LOGIN (server offers {offered})"
                )))
                .await)
        }
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        // Build PLAIN response: \0username\0password
        let credentials = format!("\0{username}\0{password}");
        let encoded = STANDARD.encode(credentials.as_bytes());

        let cmd = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(encoded),
        };

        let reply = self.send_command(cmd).await?;
        if !reply.is_success() {
            return Err(self.abort(auth_error(&reply)).await);
        }

        Ok(self.transition())
    }

    /// Authenticates using the LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        let mut reply = self.send_command(cmd).await?;

        for secret in [username, password] {
            if reply.code != ReplyCode::AUTH_CONTINUE {
                return Err(self.abort(auth_error(&reply)).await);
            }
            let payload = STANDARD.encode(secret.as_bytes());
            reply = self.send_command(Command::AuthResponse(payload)).await?;
        }

        if reply.code != ReplyCode::AUTH_SUCCEEDED {
            return Err(self.abort(auth_error(&reply)).await);
        }

        Ok(self.transition())
    }

    async fn refresh_extensions(mut self) -> Result<Self> {
        let cmd = Command::Ehlo {
            hostname: self.ehlo_name.clone(),
        };
        let reply = self.send_command(cmd).await?;

        if !reply.is_success() {
            return Err(self.reject(&reply).await);
        }

        self.server_info.set_extensions(&reply.message);
        Ok(self)
    }
}

impl<S: Upgradable> Client<S, Connected> {
    /// Upgrades the connection to TLS using STARTTLS.
    ///
    /// EHLO is sent again over the encrypted channel, as RFC 3207 requires.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not supported or if the upgrade fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(self.abort(Error::NotSupported("STARTTLS".into())).await);
        }

        let reply = self.send_command(Command::StartTls).await?;
        if reply.code != ReplyCode::SERVICE_READY {
            let err = Error::smtp_error(reply.code.as_u16(), reply.message_text());
            return Err(self.abort(err).await);
        }

        let upgraded = self.stream.into_inner().upgrade_to_tls(hostname).await?;
        debug!(host = hostname, "STARTTLS negotiated");

        let client = Self {
            stream: BufReader::new(upgraded),
            server_info: ServerInfo {
                hostname: self.server_info.hostname,
                ..ServerInfo::default()
            },
            ehlo_name: self.ehlo_name,
            _state: PhantomData,
        };
        client.refresh_extensions().await
    }
}

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<S, MailTransaction>> {
        let reply = self.send_command(Command::MailFrom { from }).await?;
        if !reply.is_success() {
            return Err(self.reject(&reply).await);
        }

        Ok(self.transition())
    }
}

impl<S> Client<S, MailTransaction>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds the first recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<S, RecipientAdded>> {
        let reply = self.send_command(Command::RcptTo { to }).await?;
        if !reply.is_success() {
            return Err(self.reject(&reply).await);
        }

        Ok(self.transition())
    }
}

impl<S> Client<S, RecipientAdded>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Self> {
        let reply = self.send_command(Command::RcptTo { to }).await?;
        if !reply.is_success() {
            return Err(self.reject(&reply).await);
        }

        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<S, Data>> {
        let reply = self.send_command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(self.reject(&reply).await);
        }

        Ok(self.transition())
    }
}

impl<S> Client<S, Data>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// byte-stuffed and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<S, Authenticated>> {
        let payload = encode_data(message);
        self.write_all(&payload).await?;

        let reply = read_reply(&mut self.stream).await?;
        if !reply.is_success() {
            return Err(self.reject(&reply).await);
        }
        debug!(bytes = payload.len(), "message accepted");

        Ok(self.transition())
    }
}

// Common implementation for all states
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the capabilities learned from the last EHLO.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp_error(reply.code.as_u16(), reply.message_text()));
        }

        Ok(())
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        debug!(command = %cmd.redacted(), "C:");
        self.write_all(&cmd.serialize()).await?;
        let reply = read_reply(&mut self.stream).await?;
        debug!(code = reply.code.as_u16(), "S: {}", reply.message_text());
        Ok(reply)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Converts a negative reply into an error and closes the session.
    async fn reject(self, reply: &Reply) -> Error {
        let err = Error::smtp_error(reply.code.as_u16(), reply.message_text());
        self.abort(err).await
    }

    /// Sends a best-effort QUIT before handing back `error`.
    ///
    /// The server is still talking to us after a negative reply, so the
    /// session is closed politely rather than by dropping the socket.
    async fn abort(self, error: Error) -> Error {
        if let Err(quit_err) = self.quit().await {
            debug!("QUIT after failure did not complete: {quit_err}");
        }
        error
    }

    fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            ehlo_name: self.ehlo_name,
            _state: PhantomData,
        }
    }
}

fn auth_error(reply: &Reply) -> Error {
    Error::Authentication {
        code: reply.code.as_u16(),
        message: reply.message_text(),
    }
}

async fn read_reply<S>(stream: &mut BufReader<S>) -> Result<Reply>
where
    S: AsyncRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if stream.read_line(&mut line).await? == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            )));
        }

        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

/// Normalizes line endings, dot-stuffs and terminates a DATA payload.
fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + 16);
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    for line in body.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;
    use tokio_test::io::{Builder, Mock};

    /// Scripted transport whose TLS upgrade is a no-op that gets recorded.
    #[derive(Debug)]
    struct Upgrading {
        inner: Mock,
        upgraded: bool,
    }

    impl Upgradable for Upgrading {
        async fn upgrade_to_tls(mut self, hostname: &str) -> Result<Self> {
            assert_eq!(hostname, "mx.example.com");
            self.upgraded = true;
            Ok(self)
        }
    }

    impl AsyncRead for Upgrading {
        fn poll_read(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for Upgrading {
        fn poll_write(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
        }

        fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.get_mut().inner).poll_flush(cx)
        }

        fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
        }
    }

    #[test]
    fn test_encode_data_normalizes_and_stuffs() {
        let out = encode_data(b"Subject: Hi\n\n.hidden\r\nlast");
        assert_eq!(out, b"Subject: Hi\r\n\r\n..hidden\r\nlast\r\n.\r\n");

        // A trailing newline does not produce an extra blank line.
        assert_eq!(encode_data(b"Body\r\n"), b"Body\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_full_plain_transaction() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx.example.com\r\n250 AUTH PLAIN LOGIN\r\n")
            .write(b"AUTH PLAIN AHVzZXJAZXhhbXBsZS5jb20Ac2VjcmV0\r\n")
            .read(b"235 2.7.0 Accepted\r\n")
            .write(b"MAIL FROM:<user@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<a@b.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 Go ahead\r\n")
            .write(b"Subject: Hi\r\n\r\nBody\r\n.\r\n")
            .read(b"250 Queued\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        assert_eq!(client.server_info().hostname, "mx.example.com");
        let client = client.ehlo("localhost").await.unwrap();
        let client = client
            .authenticate("user@example.com", "secret")
            .await
            .unwrap();
        let client = client
            .mail_from(Address::new("user@example.com").unwrap())
            .await
            .unwrap();
        let client = client.rcpt_to(Address::new("a@b.com").unwrap()).await.unwrap();
        let client = client.data().await.unwrap();
        let client = client.send_message(b"Subject: Hi\n\nBody").await.unwrap();
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_login_fallback() {
        let mock = Builder::new()
            .read(b"220 mx ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx\r\n250 AUTH LOGIN\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"235 OK\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let client = client.authenticate("user", "pass").await.unwrap();
        client.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_credentials_quit_gracefully() {
        let mock = Builder::new()
            .read(b"220 mx ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx\r\n250 AUTH PLAIN\r\n")
            .write(b"AUTH PLAIN AHUAcA==\r\n")
            .read(b"535 5.7.8 Authentication credentials invalid\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let err = client.authenticate("u", "p").await.unwrap_err();

        assert!(err.is_authentication());
        assert!(err.to_string().contains("535"));
    }

    #[tokio::test]
    async fn test_rejected_recipient() {
        let mock = Builder::new()
            .read(b"220 mx ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250 mx\r\n")
            .write(b"AUTH PLAIN AHUAcA==\r\n")
            .read(b"235 OK\r\n")
            .write(b"MAIL FROM:<u@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO:<nobody@example.com>\r\n")
            .read(b"550 5.1.1 No such user\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let client = client.authenticate("u", "p").await.unwrap();
        let client = client
            .mail_from(Address::new("u@example.com").unwrap())
            .await
            .unwrap();
        let err = client
            .rcpt_to(Address::new("nobody@example.com").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SmtpError { code: 550, .. }));
        assert_eq!(err.to_string(), "SMTP error 550: 5.1.1 No such user");
    }

    #[tokio::test]
    async fn test_unwelcoming_greeting() {
        let mock = Builder::new().read(b"554 No SMTP service here\r\n").build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::SmtpError { code: 554, .. }));
    }

    #[tokio::test]
    async fn test_connection_closed_mid_reply() {
        let mock = Builder::new().read(b"220-mx\r\n").build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_starttls_repeats_ehlo() {
        let inner = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx.example.com\r\n250 STARTTLS\r\n")
            .write(b"STARTTLS\r\n")
            .read(b"220 Ready to start TLS\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx.example.com\r\n250 AUTH PLAIN\r\n")
            .build();
        let stream = Upgrading {
            inner,
            upgraded: false,
        };

        let client = Client::from_stream(stream).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let client = client.starttls("mx.example.com").await.unwrap();

        assert!(client.stream.get_ref().upgraded);
        assert!(!client.server_info().supports_starttls());
        assert_eq!(client.server_info().auth_mechanisms(), vec![AuthMechanism::Plain]);
    }

    #[tokio::test]
    async fn test_starttls_not_advertised() {
        let inner = Builder::new()
            .read(b"220 mx ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250 mx\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();
        let stream = Upgrading {
            inner,
            upgraded: false,
        };

        let client = Client::from_stream(stream).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let err = client.starttls("mx.example.com").await.unwrap_err();

        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn test_rejected_ehlo_quits() {
        let mock = Builder::new()
            .read(b"220 mx ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"502 5.5.1 Command not implemented\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let err = client.ehlo("localhost").await.unwrap_err();

        assert!(matches!(err, Error::SmtpError { code: 502, .. }));
    }

    #[tokio::test]
    async fn test_rejected_ehlo_after_starttls_quits() {
        let inner = Builder::new()
            .read(b"220 mx.example.com ESMTP\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-mx.example.com\r\n250 STARTTLS\r\n")
            .write(b"STARTTLS\r\n")
            .read(b"220 Ready to start TLS\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"421 4.3.2 Shutting down\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 Bye\r\n")
            .build();
        let stream = Upgrading {
            inner,
            upgraded: false,
        };

        let client = Client::from_stream(stream).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let err = client.starttls("mx.example.com").await.unwrap_err();

        assert!(matches!(err, Error::SmtpError { code: 421, .. }));
    }
}
