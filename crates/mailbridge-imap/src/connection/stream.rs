//! Opening the transport.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::Result;

/// Connection to an IMAP server, encrypted or not.
pub enum ImapStream {
    /// Plain TCP, for `none` security.
    Plain(TcpStream),
    /// Implicit TLS.
    Tls(Box<TlsStream<TcpStream>>),
}

trait Transport: AsyncRead + AsyncWrite + Unpin {}

impl<T: AsyncRead + AsyncWrite + Unpin> Transport for T {}

impl ImapStream {
    fn transport(self: Pin<&mut Self>) -> Pin<&mut dyn Transport> {
        match self.get_mut() {
            Self::Plain(tcp) => Pin::new(tcp as &mut dyn Transport),
            Self::Tls(tls) => Pin::new(&mut **tls as &mut dyn Transport),
        }
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.transport().poll_read(cx, buf)
    }
}

impl AsyncWrite for ImapStream {
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

fn tls_connector() -> TlsConnector {
    let roots: rustls::RootCertStore = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Connects to a server with TLS from the start.
pub async fn connect_tls(host: &str, port: u16) -> Result<ImapStream> {
    debug!(host, port, "connecting (implicit TLS)");
    let server_name = ServerName::try_from(host.to_string())?;
    let tcp = TcpStream::connect((host, port)).await?;
    let tls = tls_connector().connect(server_name, tcp).await?;

    Ok(ImapStream::Tls(Box::new(tls)))
}

/// Connects to a server without TLS.
pub async fn connect_plain(host: &str, port: u16) -> Result<ImapStream> {
    debug!(host, port, "connecting (plain)");
    let tcp = TcpStream::connect((host, port)).await?;
    Ok(ImapStream::Plain(tcp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_invalid_dns_name_fails_before_connecting() {
        let result = connect_tls("not a hostname", 993).await;
        assert!(matches!(result, Err(Error::InvalidDnsName(_))));
    }

    #[tokio::test]
    async fn test_refused_connection_is_io_error() {
        let result = connect_plain("127.0.0.1", 1).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
