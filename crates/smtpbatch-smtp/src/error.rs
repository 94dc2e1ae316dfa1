//! Transport failures.
//!
//! A server answering with a non-success reply code is *not* an error here;
//! replies are returned as values and the caller decides what they mean.
//! Everything in [`Error`] is a failure to complete the exchange at all.

use std::io;
use std::time::Duration;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake failed.
    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),

    /// Operation did not complete in time.
    #[error("Timed out after {}s waiting for {operation}", .after.as_secs())]
    Timeout {
        /// What was being waited on.
        operation: &'static str,
        /// Configured limit.
        after: Duration,
    },

    /// Peer closed the connection mid-exchange.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Malformed or unexpected data from the server.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server name cannot be used for TLS verification.
    #[error("Invalid hostname: {0}")]
    InvalidHostname(String),

    /// Command issued without an open connection.
    #[error("Not connected")]
    NotConnected,

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// Returns true if the failure came from the clock rather than the peer.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
