//! Per-message envelope.

use crate::config::SenderSource;
use crate::source::{HeaderEnvelope, push_unique};
use smtpbatch_smtp::Address;
use thiserror::Error;

/// Why no envelope could be built for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Sender comes from the headers and there is no usable `From`.
    #[error("no usable From header")]
    MissingSender,
    /// No recipient from any source.
    #[error("no recipients")]
    NoRecipients,
}

/// Sender and recipients for exactly one message transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// `MAIL FROM` address.
    pub sender: Address,
    /// `RCPT TO` addresses, in order.
    pub recipients: Vec<Address>,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(sender: Address, recipients: Vec<Address>) -> Self {
        Self { sender, recipients }
    }

    /// Combines configured and header-derived addresses.
    ///
    /// Header recipients (when `use_header_recipients`) come first, then
    /// `extra` recipients; duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the sender or every recipient is missing.
    pub fn resolve(
        sender: &SenderSource,
        use_header_recipients: bool,
        extra: &[Address],
        headers: HeaderEnvelope,
    ) -> Result<Self, EnvelopeError> {
        let sender = match sender {
            SenderSource::Explicit(address) => address.clone(),
            SenderSource::FromHeader => headers.sender.ok_or(EnvelopeError::MissingSender)?,
        };

        let mut recipients = if use_header_recipients {
            headers.recipients
        } else {
            Vec::new()
        };
        for addr in extra {
            push_unique(&mut recipients, addr.clone());
        }

        if recipients.is_empty() {
            return Err(EnvelopeError::NoRecipients);
        }
        Ok(Self::new(sender, recipients))
    }
}
