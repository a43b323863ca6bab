//! Transport abstraction over plain TCP and TLS.

use anyhow::Result;
use pin_project_lite::pin_project;
use rustls::pki_types::ServerName;
use rustls::RootCertStore;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::client_error;

pin_project! {
    /// The session transport, either plain TCP or TLS over TCP.
    #[derive(Debug)]
    #[project = ClientStreamProj]
    pub enum ClientStream {
        Plain { #[pin] stream: TcpStream },
        Tls { #[pin] stream: TlsStream<TcpStream> },
    }
}

impl ClientStream {
    pub fn is_tls(&self) -> bool {
        matches!(self, ClientStream::Tls { .. })
    }
}

impl AsyncRead for ClientStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            ClientStreamProj::Plain { stream } => stream.poll_read(cx, buf),
            ClientStreamProj::Tls { stream } => stream.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ClientStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.project() {
            ClientStreamProj::Plain { stream } => stream.poll_write(cx, buf),
            ClientStreamProj::Tls { stream } => stream.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            ClientStreamProj::Plain { stream } => stream.poll_flush(cx),
            ClientStreamProj::Tls { stream } => stream.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            ClientStreamProj::Plain { stream } => stream.poll_shutdown(cx),
            ClientStreamProj::Tls { stream } => stream.poll_shutdown(cx),
        }
    }
}

/// Open a socket to the broker, wrapping it in TLS when asked for. Both the TCP
/// connect and the TLS handshake run under the connect timeout.
pub(crate) async fn connect(
    host: &str,
    port: u16,
    ssl: bool,
    connect_timeout: std::time::Duration,
) -> Result<ClientStream> {
    let address = format!("{}:{}", host, port);

    let tcp = match tokio::time::timeout(connect_timeout, TcpStream::connect(&address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return client_error!(None, 501, format!("Connection error {:?}", e), 0);
        }
        Err(_) => {
            return client_error!(None, 501, format!("Connect timeout to {}", address), 0);
        }
    };

    if !ssl {
        return Ok(ClientStream::Plain { stream: tcp });
    }

    let connector = tls_connector();
    let server_name = match ServerName::try_from(host.to_string()) {
        Ok(name) => name,
        Err(_) => {
            return client_error!(None, 501, format!("Invalid server name {}", host), 0);
        }
    };

    match tokio::time::timeout(connect_timeout, connector.connect(server_name, tcp)).await {
        Ok(Ok(stream)) => Ok(ClientStream::Tls { stream }),
        Ok(Err(e)) => client_error!(None, 501, format!("TLS handshake error {:?}", e), 0),
        Err(_) => client_error!(None, 501, format!("TLS handshake timeout to {}", address), 0),
    }
}

fn tls_connector() -> TlsConnector {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
