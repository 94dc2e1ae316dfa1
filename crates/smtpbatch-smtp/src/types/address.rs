//! Envelope addresses.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A mailbox as it goes between the angle brackets of `MAIL FROM` and
/// `RCPT TO`.
///
/// Only the shape is checked: one `@` splitting a non-empty local part from
/// a non-empty domain, no control characters and no brackets. Whitespace is
/// allowed only inside a quoted local part such as `"john doe"@example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Parses an address; one pair of enclosing angle brackets and the
    /// surrounding whitespace are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] naming what is wrong.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        let bare = trimmed
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(trimmed)
            .trim();

        let invalid = |why: &str| Err(Error::InvalidAddress(format!("{bare:?}: {why}")));

        if bare.is_empty() {
            return invalid("empty");
        }
        if bare.contains(['<', '>']) {
            return invalid("unbalanced angle bracket");
        }
        // A quoted local part may itself contain '@'.
        let Some((local, domain)) = bare.rsplit_once('@') else {
            return invalid("no @");
        };
        if local.is_empty() {
            return invalid("empty local part");
        }
        if domain.is_empty() {
            return invalid("empty domain");
        }
        if domain.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return invalid("contains whitespace or control characters");
        }
        match quoted_content(local) {
            Some(inner) if !valid_quoted(inner) => invalid("malformed quoted local part"),
            Some(_) => Ok(Self(bare.to_string())),
            None if local.starts_with('"') => invalid("malformed quoted local part"),
            None if local.chars().any(|c| c.is_whitespace() || c.is_control()) => {
                invalid("contains whitespace or control characters")
            }
            None => Ok(Self(bare.to_string())),
        }
    }

    /// The address without brackets.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything after the last `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

/// The text between the quotes of a `"..."` local part.
fn quoted_content(local: &str) -> Option<&str> {
    local.strip_prefix('"')?.strip_suffix('"')
}

/// Quoted-string body: spaces and tabs allowed, `"` and `\\` only escaped.
fn valid_quoted(inner: &str) -> bool {
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if !escaped.is_control() || escaped == '\t' => {}
                _ => return false,
            },
            '"' => return false,
            ' ' | '\t' => {}
            c if c.is_control() => return false,
            _ => {}
        }
    }
    true
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
