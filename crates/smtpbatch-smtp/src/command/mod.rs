//! Client commands and DATA payload encoding.

use crate::types::{Address, AuthMechanism};
use std::fmt;

/// A command the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `EHLO <name>`
    Ehlo {
        /// Name the client announces
        hostname: String,
    },
    /// `STARTTLS`
    StartTls,
    /// `AUTH <mechanism> [initial-response]`
    Auth {
        /// SASL mechanism
        mechanism: AuthMechanism,
        /// Base64 initial response
        initial_response: Option<String>,
    },
    /// Base64 answer to a 334 challenge
    AuthResponse(String),
    /// `MAIL FROM:<from> [SIZE=n]`
    MailFrom {
        /// Envelope sender
        from: Address,
        /// Message size declaration
        size: Option<usize>,
    },
    /// `RCPT TO:<to>`
    RcptTo {
        /// Envelope recipient
        to: Address,
    },
    /// `DATA`
    Data,
    /// `RSET`
    Rset,
    /// `QUIT`
    Quit,
}

impl Command {
    /// Wire form, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = self.to_string().into_bytes();
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Rendering safe for logs: credentials are replaced by `*`.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Auth {
                mechanism,
                initial_response: Some(_),
            } => format!("AUTH {mechanism} *"),
            Self::AuthResponse(_) => "*".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ehlo { hostname } => write!(f, "EHLO {hostname}"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::Auth {
                mechanism,
                initial_response,
            } => {
                write!(f, "AUTH {mechanism}")?;
                if let Some(resp) = initial_response {
                    write!(f, " {resp}")?;
                }
                Ok(())
            }
            Self::AuthResponse(line) => f.write_str(line),
            Self::MailFrom { from, size } => {
                write!(f, "MAIL FROM:<{from}>")?;
                if let Some(size) = size {
                    write!(f, " SIZE={size}")?;
                }
                Ok(())
            }
            Self::RcptTo { to } => write!(f, "RCPT TO:<{to}>"),
            Self::Data => f.write_str("DATA"),
            Self::Rset => f.write_str("RSET"),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}

/// Encodes message content for the DATA phase.
///
/// Every line is terminated with CRLF whatever its original ending, lines
/// starting with `.` get an extra leading `.`, and the `.` terminator line is
/// appended.
#[must_use]
pub fn encode_data(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + content.len() / 32 + 5);
    let body = content.strip_suffix(b"\n").unwrap_or(content);

    if !content.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
