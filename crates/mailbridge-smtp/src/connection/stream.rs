//! Low-level SMTP stream handling.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::debug;

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(TcpStream),
    /// TLS-encrypted connection (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

/// A transport that can be switched to TLS in place, as STARTTLS requires.
#[allow(async_fn_in_trait)]
pub trait Upgradable: AsyncRead + AsyncWrite + Unpin + Sized {
    /// Performs the TLS handshake over the existing connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream cannot be upgraded or the handshake
    /// fails.
    async fn upgrade_to_tls(self, hostname: &str) -> Result<Self>;
}

impl Upgradable for SmtpStream {
    async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let tcp_stream = match self {
            Self::Tcp(stream) => stream,
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };

        let tls_stream = handshake(hostname, tcp_stream).await?;
        Ok(Self::Tls(Box::new(tls_stream)))
    }
}

trait Transport: AsyncRead + AsyncWrite + Unpin {}

impl<T: AsyncRead + AsyncWrite + Unpin> Transport for T {}

impl SmtpStream {
    fn transport(self: Pin<&mut Self>) -> Pin<&mut dyn Transport> {
        match self.get_mut() {
            Self::Tcp(tcp) => Pin::new(tcp as &mut dyn Transport),
            Self::Tls(tls) => Pin::new(&mut **tls as &mut dyn Transport),
        }
    }
}

impl AsyncRead for SmtpStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.transport().poll_read(cx, buf)
    }
}

impl AsyncWrite for SmtpStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.transport().poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.transport().poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.transport().poll_shutdown(cx)
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    debug!(host = hostname, port, "connecting (plain)");
    let stream = TcpStream::connect((hostname, port)).await?;
    Ok(SmtpStream::Tcp(stream))
}

/// Connects to an SMTP server over TLS (implicit TLS on port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    debug!(host = hostname, port, "connecting (implicit TLS)");
    let tcp_stream = TcpStream::connect((hostname, port)).await?;
    let tls_stream = handshake(hostname, tcp_stream).await?;
    Ok(SmtpStream::Tls(Box::new(tls_stream)))
}

async fn handshake(hostname: &str, tcp_stream: TcpStream) -> Result<TlsStream<TcpStream>> {
    let connector = tls_connector();
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

    Ok(connector.connect(server_name, tcp_stream).await?)
}

fn tls_connector() -> TlsConnector {
    let roots: RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_io_error() {
        // Port 1 on loopback is closed on any sane test machine.
        let result = connect("127.0.0.1", 1).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_upgrade_rejects_invalid_hostname() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let tcp = TcpStream::connect(addr).await.unwrap();

        let result = SmtpStream::Tcp(tcp).upgrade_to_tls("not a hostname").await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }
}
