//! Low-level SMTP stream handling.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::debug;

/// Anything the client can speak SMTP over.
///
/// Implemented for every `AsyncRead + AsyncWrite` type, so plain sockets and
/// in-memory test streams are interchangeable.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

/// Boxed underlying byte stream.
pub type BoxedStream = Box<dyn AsyncStream>;

/// Longest reply line accepted; RFC 5321 allows 512 octets.
const MAX_LINE_LEN: usize = 4096;

/// SMTP stream (plain or TLS) with an I/O deadline applied to every operation.
pub struct SmtpStream {
    inner: Inner,
    timeout: Duration,
}

enum Inner {
    Plain(BufReader<BoxedStream>),
    Tls(Box<BufReader<TlsStream<BoxedStream>>>),
}

impl fmt::Debug for SmtpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpStream")
            .field("tls", &self.is_tls())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SmtpStream {
    /// Wraps an already-connected byte stream.
    #[must_use]
    pub fn new(stream: BoxedStream, timeout: Duration) -> Self {
        Self {
            inner: Inner::Plain(BufReader::new(stream)),
            timeout,
        }
    }

    /// Returns true once STARTTLS has completed.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self.inner, Inner::Tls(_))
    }

    /// Reads one line, stripped of its terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails, times out, or the peer closes the
    /// connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut raw = Vec::new();
        let read = match &mut self.inner {
            Inner::Plain(reader) => {
                with_timeout(self.timeout, "reply", reader.read_until(b'\n', &mut raw)).await?
            }
            Inner::Tls(reader) => {
                with_timeout(self.timeout, "reply", reader.read_until(b'\n', &mut raw)).await?
            }
        };

        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        if raw.len() > MAX_LINE_LEN {
            return Err(Error::Protocol(format!(
                "Reply line exceeds {MAX_LINE_LEN} bytes"
            )));
        }

        let line = String::from_utf8_lossy(&raw);
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or times out.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match &mut self.inner {
            Inner::Plain(reader) => {
                with_timeout(self.timeout, "write", write_flush(reader.get_mut(), data)).await
            }
            Inner::Tls(reader) => {
                with_timeout(self.timeout, "write", write_flush(reader.get_mut(), data)).await
            }
        }
    }

    /// Upgrades a plain stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already TLS, the hostname is not a
    /// valid server name, or the TLS handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let plain = match self.inner {
            Inner::Plain(reader) => reader.into_inner(),
            Inner::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };

        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|_| Error::InvalidHostname(hostname.to_string()))?;

        let handshake = create_tls_connector().connect(server_name, plain);
        let tls_stream = match tokio::time::timeout(self.timeout, handshake).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(Error::Tls(e)),
            Err(_) => {
                return Err(Error::Timeout {
                    operation: "TLS handshake",
                    after: self.timeout,
                });
            }
        };

        Ok(Self {
            inner: Inner::Tls(Box::new(BufReader::new(tls_stream))),
            timeout: self.timeout,
        })
    }

    /// Shuts down the write half. A failure is logged; the stream is
    /// dropped afterwards either way.
    pub async fn shutdown(&mut self) {
        let result = match &mut self.inner {
            Inner::Plain(reader) => reader.get_mut().shutdown().await,
            Inner::Tls(reader) => reader.get_mut().shutdown().await,
        };
        if let Err(e) = result {
            debug!(error = %e, "stream shutdown failed");
        }
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails or times out.
pub async fn connect(hostname: &str, port: u16, timeout: Duration) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    let stream = with_timeout(timeout, "connect", TcpStream::connect(&addr)).await?;
    stream.set_nodelay(true)?;
    Ok(SmtpStream::new(Box::new(stream), timeout))
}

async fn write_flush<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> std::io::Result<()> {
    writer.write_all(data).await?;
    writer.flush().await
}

async fn with_timeout<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = std::io::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::Timeout {
            operation,
            after: limit,
        }),
    }
}

/// Creates a TLS connector trusting the webpki root set.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
