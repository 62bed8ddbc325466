//! IMAP implementation of [`InboundSession`].

use mailbridge_imap::connection::{connect_plain, connect_tls};
use mailbridge_imap::{
    Client, DEFAULT_MAILBOX, FetchAttribute, FetchItem, ImapStream, SeqNum, Selected, SequenceSet,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::{InboundSession, TcpConnector};
use crate::error::FetchFailure;
use crate::profile::{InboundConfig, InboundSecurity};

/// Opens the transport for an inbound session.
#[allow(async_fn_in_trait)]
pub trait ImapConnector {
    /// Transport type.
    type Stream: AsyncRead + AsyncWrite + Unpin;

    /// Connects to `host:port`, with TLS if `tls` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or TLS handshake fails.
    async fn connect(
        &self,
        host: &str,
        port: u16,
        tls: bool,
    ) -> mailbridge_imap::Result<Self::Stream>;
}

impl ImapConnector for TcpConnector {
    type Stream = ImapStream;

    async fn connect(&self, host: &str, port: u16, tls: bool) -> mailbridge_imap::Result<ImapStream> {
        if tls {
            connect_tls(host, port).await
        } else {
            connect_plain(host, port).await
        }
    }
}

/// Reads the newest messages of `INBOX` over IMAP.
#[derive(Debug, Clone, Default)]
pub struct ImapInbound<C = TcpConnector> {
    connector: C,
}

impl ImapInbound {
    /// Create a session that connects over the network.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connector: TcpConnector,
        }
    }
}

impl<C: ImapConnector> ImapInbound<C> {
    /// Create a session that obtains its transport from `connector`.
    pub const fn with_connector(connector: C) -> Self {
        Self { connector }
    }
}

impl<C: ImapConnector> InboundSession for ImapInbound<C> {
    async fn fetch_latest(
        &self,
        config: &InboundConfig,
        count: usize,
    ) -> Result<Vec<String>, FetchFailure> {
        let port = config.effective_port();
        debug!(
            host = %config.host,
            port,
            security = config.security.as_str(),
            "opening IMAP session"
        );
        let stream = self
            .connector
            .connect(&config.host, port, config.security == InboundSecurity::Tls)
            .await?;

        let client = Client::from_stream(stream).await?;
        let client = client.login(&config.user, &config.password).await?;
        let (mut client, status) = client.select(DEFAULT_MAILBOX).await?;
        debug!(exists = status.exists, "mailbox selected");

        match read_latest(&mut client, count).await {
            Ok(messages) => {
                client.logout().await?;
                info!(host = %config.host, count = messages.len(), "messages fetched");
                Ok(messages)
            }
            Err(err) => {
                if let Err(logout_err) = client.logout().await {
                    debug!("LOGOUT after failure did not complete: {logout_err}");
                }
                Err(err)
            }
        }
    }
}

/// The last `count` identifiers, in server order.
#[must_use]
pub fn latest_ids(ids: &[SeqNum], count: usize) -> &[SeqNum] {
    &ids[ids.len().saturating_sub(count)..]
}

async fn read_latest<S>(
    client: &mut Client<S, Selected>,
    count: usize,
) -> Result<Vec<String>, FetchFailure>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ids = client.search("ALL").await?;
    let wanted = latest_ids(&ids, count);
    let mut messages = Vec::with_capacity(wanted.len());

    for &seq in wanted {
        let fetched = client
            .fetch(&SequenceSet::from(seq), &[FetchAttribute::Rfc822])
            .await?;

        let body = fetched
            .into_iter()
            .filter(|(fetched_seq, _)| *fetched_seq == seq)
            .flat_map(|(_, items)| items)
            .find_map(|item| match item {
                FetchItem::Rfc822(Some(bytes)) => Some(bytes),
                _ => None,
            })
            .ok_or_else(|| {
                FetchFailure::Protocol(mailbridge_imap::Error::Protocol(format!(
                    "no RFC822 data for message {seq}"
                )))
            })?;

        let text = String::from_utf8(body).map_err(|source| FetchFailure::Decode {
            seq: seq.get(),
            source,
        })?;
        messages.push(text);
    }

    Ok(messages)
}
