//! Connections: byte streams, the SMTP client, and what the server offers.

mod client;
mod stream;

pub use client::SmtpClient;
pub use stream::{AsyncStream, BoxedStream, SmtpStream, connect};

use crate::types::{AuthMechanism, Extension, Reply};

/// What a server announced in its EHLO reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// Name from the first EHLO line.
    pub hostname: String,
    /// Extensions in the order they were listed.
    pub extensions: Vec<Extension>,
}

impl ServerInfo {
    /// Reads the server name and extensions from a 250 EHLO reply.
    #[must_use]
    pub fn from_ehlo(reply: &Reply) -> Self {
        let mut lines = reply.lines.iter();
        let hostname = lines
            .next()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or_default()
            .to_string();

        Self {
            hostname,
            extensions: lines.map(|line| Extension::parse(line)).collect(),
        }
    }

    /// Returns true if STARTTLS was offered.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extensions.contains(&Extension::StartTls)
    }

    /// Returns true if SIZE was offered, with or without a limit.
    #[must_use]
    pub fn supports_size(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Size(_)))
    }

    /// Usable AUTH mechanisms, in advertised order.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .filter_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }
}
