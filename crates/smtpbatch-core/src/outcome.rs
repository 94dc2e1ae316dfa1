//! Per-message results and the batch summary.

use smtpbatch_smtp::{Address, Reply};
use std::fmt;
use std::path::PathBuf;

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Accepted by the server after DATA.
    Sent,
    /// No recipient was resolved from the configuration or the headers.
    SkippedNoRecipients,
    /// The server refused the sender at MAIL FROM, or every recipient at
    /// RCPT TO.
    SkippedRejectedAtEnvelope {
        /// The refusal; the last one when all recipients were refused.
        reply: Reply,
    },
    /// A recipient was rejected and the abort policy stopped the message.
    AbortedAtRecipient {
        /// The rejected recipient.
        recipient: Address,
        /// The RCPT TO reply.
        reply: Reply,
    },
    /// The file could not be read or did not yield a usable message.
    SkippedOpenOrValidationError {
        /// One-line reason.
        reason: String,
    },
    /// The server refused the content.
    RejectedAtData {
        /// The DATA reply.
        reply: Reply,
    },
    /// The connection broke during DATA; the batch reconnects for the next message.
    DataTransportFailed {
        /// The transport failure, rendered.
        error: String,
    },
}

impl Outcome {
    /// Returns true for [`Outcome::Sent`].
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => f.write_str("sent"),
            Self::SkippedNoRecipients => f.write_str("skipped: no recipients"),
            Self::SkippedRejectedAtEnvelope { reply } => {
                write!(f, "skipped: rejected at envelope: {reply}")
            }
            Self::AbortedAtRecipient { recipient, reply } => {
                write!(f, "aborted: recipient {recipient} rejected: {reply}")
            }
            Self::SkippedOpenOrValidationError { reason } => write!(f, "skipped: {reason}"),
            Self::RejectedAtData { reply } => write!(f, "rejected at DATA: {reply}"),
            Self::DataTransportFailed { error } => write!(f, "DATA failed: {error}"),
        }
    }
}

/// Outcomes of a whole batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One entry per input file.
    pub outcomes: Vec<(PathBuf, Outcome)>,
}

impl BatchReport {
    /// Records one message.
    pub fn record(&mut self, path: impl Into<PathBuf>, outcome: Outcome) {
        self.outcomes.push((path.into(), outcome));
    }

    /// Number of messages sent.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_sent()).count()
    }

    /// Number of messages not sent, for whatever reason.
    #[must_use]
    pub fn not_sent(&self) -> usize {
        self.outcomes.len() - self.sent()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use smtpbatch_smtp::ReplyCode;

    #[test]
    fn report_counts() {
        let mut report = BatchReport::default();
        report.record("a.eml", Outcome::Sent);
        report.record("b.eml", Outcome::SkippedNoRecipients);
        report.record("c.eml", Outcome::Sent);
        assert_eq!(report.sent(), 2);
        assert_eq!(report.not_sent(), 1);
    }

    #[test]
    fn display_includes_server_text() {
        let outcome = Outcome::AbortedAtRecipient {
            recipient: Address::new("x@example.com").unwrap(),
            reply: Reply::new(ReplyCode::MAILBOX_UNAVAILABLE, vec!["unknown user".into()]),
        };
        assert_eq!(
            outcome.to_string(),
            "aborted: recipient x@example.com rejected: 550 unknown user"
        );
    }
}
