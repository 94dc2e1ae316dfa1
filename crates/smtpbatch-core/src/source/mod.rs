//! Message source: file contents and header-derived addresses.

mod headers;

use headers::{field_addresses, parse_block};

use smtpbatch_smtp::Address;
use std::path::Path;
use tracing::warn;

/// Content shorter than this is not a plausible message and is skipped.
pub const MIN_CONTENT_LEN: usize = 100;

/// Reads one message file.
///
/// With `normalize_line_endings`, CRLF and lone CR become LF; otherwise the
/// bytes are returned untouched.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be read.
pub async fn read_content(path: &Path, normalize_line_endings: bool) -> std::io::Result<Vec<u8>> {
    let content = tokio::fs::read(path).await?;
    Ok(if normalize_line_endings {
        normalize_eol(&content)
    } else {
        content
    })
}

/// Converts CRLF and lone CR to LF.
#[must_use]
pub fn normalize_eol(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut bytes = content.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' {
            if bytes.peek() == Some(&b'\n') {
                bytes.next();
            }
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    out
}

/// Addresses found in a message's headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderEnvelope {
    /// First address of the `From` header.
    pub sender: Option<Address>,
    /// `To`, then `Cc`, then `Bcc`, without duplicates.
    pub recipients: Vec<Address>,
}

/// Extracts the sender and recipients from the message headers.
///
/// Entries that are not valid addresses are logged and skipped.
#[must_use]
pub fn extract_envelope_from_headers(content: &[u8]) -> HeaderEnvelope {
    let headers = parse_block(content);

    let sender = field_addresses(&headers, "From")
        .into_iter()
        .next()
        .and_then(|raw| valid_address("From", &raw));

    let mut recipients: Vec<Address> = Vec::new();
    for field in ["To", "Cc", "Bcc"] {
        for raw in field_addresses(&headers, field) {
            if let Some(addr) = valid_address(field, &raw) {
                push_unique(&mut recipients, addr);
            }
        }
    }

    HeaderEnvelope { sender, recipients }
}

/// Appends `addr` unless an address differing only in ASCII case is present.
pub(crate) fn push_unique(list: &mut Vec<Address>, addr: Address) {
    if !list
        .iter()
        .any(|a| a.as_str().eq_ignore_ascii_case(addr.as_str()))
    {
        list.push(addr);
    }
}

fn valid_address(field: &str, raw: &str) -> Option<Address> {
    match Address::new(raw) {
        Ok(addr) => Some(addr),
        Err(e) => {
            warn!(field, address = raw, error = %e, "ignoring unusable header address");
            None
        }
    }
}
