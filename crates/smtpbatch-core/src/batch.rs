//! Batch runner: one session, many message files.

use crate::config::BatchConfig;
use crate::envelope::{Envelope, EnvelopeError};
use crate::error::Result;
use crate::outcome::{BatchReport, Outcome};
use crate::session::Session;
use crate::source::{self, HeaderEnvelope, MIN_CONTENT_LEN};
use smtpbatch_smtp::Transport;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sends every file in `files` through `session`.
///
/// Messages that cannot be read or addressed are skipped before any
/// connection is made for them. A still-open connection is closed with QUIT
/// when the batch ends.
///
/// # Errors
///
/// Returns the first fatal error; no further files are processed and the
/// transport is already closed.
pub async fn run_batch<T: Transport>(
    session: &mut Session<T>,
    config: &BatchConfig,
    files: &[PathBuf],
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for path in files {
        let outcome = process_file(session, config, path).await?;
        match &outcome {
            Outcome::Sent => info!(file = %path.display(), "sent"),
            other => warn!(file = %path.display(), "{other}"),
        }
        report.record(path, outcome);
    }

    session.quit().await;
    info!(
        sent = report.sent(),
        not_sent = report.not_sent(),
        "batch complete"
    );
    Ok(report)
}

async fn process_file<T: Transport>(
    session: &mut Session<T>,
    config: &BatchConfig,
    path: &Path,
) -> Result<Outcome> {
    let content = match source::read_content(path, config.normalize_line_endings).await {
        Ok(content) => content,
        Err(e) => {
            return Ok(Outcome::SkippedOpenOrValidationError {
                reason: format!("cannot read {}: {e}", path.display()),
            });
        }
    };

    if content.len() < MIN_CONTENT_LEN {
        return Ok(Outcome::SkippedOpenOrValidationError {
            reason: format!(
                "only {} bytes, not a plausible message (minimum {MIN_CONTENT_LEN})",
                content.len()
            ),
        });
    }

    let headers = if config.needs_headers() {
        source::extract_envelope_from_headers(&content)
    } else {
        HeaderEnvelope::default()
    };

    let envelope = match Envelope::resolve(
        &config.sender,
        config.header_recipients,
        &config.extra_recipients,
        headers,
    ) {
        Ok(envelope) => envelope,
        Err(EnvelopeError::NoRecipients) => return Ok(Outcome::SkippedNoRecipients),
        Err(e @ EnvelopeError::MissingSender) => {
            return Ok(Outcome::SkippedOpenOrValidationError {
                reason: e.to_string(),
            });
        }
    };

    session.connect(&config.connection).await?;
    let outcome = session
        .send_message(&envelope, &content, config.recipient_policy)
        .await?;
    session
        .disconnect_if_requested(config.disconnect_policy)
        .await;
    Ok(outcome)
}
