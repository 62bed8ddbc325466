//! SMTP implementation of [`OutboundSession`].

use mailbridge_smtp::connection::{connect, connect_tls};
use mailbridge_smtp::{Address, Client, SmtpStream, Upgradable};
use tracing::{debug, info};

use super::{OutboundSession, OutgoingMessage, TcpConnector};
use crate::error::SendFailure;
use crate::profile::{OutboundConfig, OutboundSecurity};

/// Name announced in EHLO.
const EHLO_NAME: &str = "localhost";

/// Opens the transport for an outbound session.
#[allow(async_fn_in_trait)]
pub trait SmtpConnector {
    /// Transport type; must support an in-place STARTTLS upgrade.
    type Stream: Upgradable;

    /// Connects to `host:port`, with TLS from the first byte if `implicit_tls`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or TLS handshake fails.
    async fn connect(
        &self,
        host: &str,
        port: u16,
        implicit_tls: bool,
    ) -> mailbridge_smtp::Result<Self::Stream>;
}

impl SmtpConnector for TcpConnector {
    type Stream = SmtpStream;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        implicit_tls: bool,
    ) -> mailbridge_smtp::Result<SmtpStream> {
        if implicit_tls {
            connect_tls(host, port).await
        } else {
            connect(host, port).await
        }
    }
}

/// Sends mail over SMTP, one connection per message.
#[derive(Debug, Clone, Default)]
pub struct SmtpOutbound<C = TcpConnector> {
    connector: C,
}

impl SmtpOutbound {
    /// Create a session that connects over the network.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connector: TcpConnector,
        }
    }
}

impl<C: SmtpConnector> SmtpOutbound<C> {
    /// Create a session that obtains its transport from `connector`.
    pub const fn with_connector(connector: C) -> Self {
        Self { connector }
    }
}

impl<C: SmtpConnector> OutboundSession for SmtpOutbound<C> {
    async fn send(
        &self,
        config: &OutboundConfig,
        message: &OutgoingMessage,
    ) -> Result<(), SendFailure> {
        let sender = Address::new(config.user.as_str())?;
        let mut recipients = message
            .recipients()
            .map(Address::new)
            .collect::<mailbridge_smtp::Result<Vec<_>>>()?
            .into_iter();
        let Some(first) = recipients.next() else {
            return Err(SendFailure::Protocol(mailbridge_smtp::Error::InvalidAddress(
                "no recipients".to_string(),
            )));
        };

        debug!(
            host = %config.host,
            port = config.port,
            security = config.security.as_str(),
            "opening SMTP session"
        );
        let implicit_tls = config.security == OutboundSecurity::Tls;
        let stream = self
            .connector
            .connect(&config.host, config.port, implicit_tls)
            .await?;

        let client = Client::from_stream(stream).await?;
        let client = client.ehlo(EHLO_NAME).await?;
        let client = if config.security == OutboundSecurity::StartTls {
            client.starttls(&config.host).await?
        } else {
            client
        };
        let client = client
            .authenticate(&config.user, &config.password)
            .await?;

        let client = client.mail_from(sender).await?;
        let mut client = client.rcpt_to(first).await?;
        for recipient in recipients {
            client = client.rcpt_to(recipient).await?;
        }
        let client = client.data().await?;
        let client = client.send_message(message.to_rfc822().as_bytes()).await?;
        client.quit().await?;

        info!(host = %config.host, "message submitted");
        Ok(())
    }
}
