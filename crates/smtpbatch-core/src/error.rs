//! Error types for the core library.

use smtpbatch_smtp::Reply;
use std::fmt;
use thiserror::Error;

/// Protocol step at which a fatal error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the connection and reading the greeting.
    Connect,
    /// EHLO, initial or after STARTTLS.
    Ehlo,
    /// STARTTLS command or handshake.
    StartTls,
    /// AUTH exchange.
    Auth,
    /// MAIL FROM.
    MailFrom,
    /// RCPT TO.
    RcptTo,
    /// RSET after an abandoned envelope.
    Rset,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Ehlo => "EHLO",
            Self::StartTls => "STARTTLS",
            Self::Auth => "AUTH",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Rset => "RSET",
        })
    }
}

/// Conditions that end the whole batch.
///
/// Per-message problems are never errors; they are reported as an
/// [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed while the connection was required to be sound.
    #[error("{stage} failed: {source}")]
    Transport {
        /// Step that failed.
        stage: Stage,
        /// Underlying transport failure.
        #[source]
        source: smtpbatch_smtp::Error,
    },

    /// The server refused a connection-phase step.
    #[error("{stage} rejected by server: {reply}")]
    Rejected {
        /// Step that was refused.
        stage: Stage,
        /// The server's reply, code and text.
        reply: Reply,
    },

    /// TLS is mandatory but the server did not offer STARTTLS.
    #[error("TLS required but server does not advertise STARTTLS")]
    StartTlsNotOffered,

    /// Credentials were given but no supported AUTH mechanism was advertised.
    #[error("no supported AUTH mechanism advertised (need PLAIN or LOGIN)")]
    NoAuthMechanism,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
