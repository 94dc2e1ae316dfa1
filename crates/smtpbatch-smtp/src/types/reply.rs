//! Server replies.

use std::fmt;

/// A complete, possibly multi-line, server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Three-digit code shared by every line.
    pub code: ReplyCode,
    /// Text of each line, without code or separator.
    pub lines: Vec<String>,
}

impl Reply {
    /// Creates a reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Returns true if the reply carries exactly `code`.
    #[must_use]
    pub fn is(&self, code: ReplyCode) -> bool {
        self.code == code
    }

    /// RFC 3463 enhanced status code from the first line, e.g. `5.1.1`.
    #[must_use]
    pub fn enhanced_status(&self) -> Option<&str> {
        let first = self.lines.first()?.split_whitespace().next()?;
        let mut parts = first.split('.');
        let class = parts.next()?;
        let valid = matches!(class, "2" | "4" | "5")
            && parts.clone().count() == 2
            && parts.all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        valid.then_some(first)
    }
}

/// One-line rendering for diagnostics: `550 5.1.1 no such user`.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        for line in self.lines.iter().filter(|l| !l.is_empty()) {
            write!(f, " {line}")?;
        }
        Ok(())
    }
}

/// Three-digit SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 closing channel
    pub const CLOSING: Self = Self(221);
    /// 235 authentication succeeded
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 completed
    pub const OK: Self = Self(250);
    /// 251 user not local, will forward
    pub const FORWARD: Self = Self(251);
    /// 334 authentication challenge
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 service not available, channel closing
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 535 authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 mailbox unavailable
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);

    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(code: u16, lines: &[&str]) -> Reply {
        Reply::new(
            ReplyCode::new(code),
            lines.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn exact_code_match() {
        let forwarded = reply(251, &["forwarding"]);
        assert!(forwarded.is(ReplyCode::FORWARD));
        assert!(!forwarded.is(ReplyCode::OK));
    }

    #[test]
    fn display_is_one_line() {
        assert_eq!(
            reply(550, &["5.1.1 no such user"]).to_string(),
            "550 5.1.1 no such user"
        );
        assert_eq!(reply(421, &["", "going", "down"]).to_string(), "421 going down");
        assert_eq!(reply(250, &[""]).to_string(), "250");
    }

    #[test]
    fn enhanced_status() {
        assert_eq!(
            reply(550, &["5.1.1 no such user"]).enhanced_status(),
            Some("5.1.1")
        );
        assert_eq!(reply(250, &["2.0.0"]).enhanced_status(), Some("2.0.0"));
        assert_eq!(reply(250, &["mx.example.com"]).enhanced_status(), None);
        assert_eq!(reply(550, &["5.1 short"]).enhanced_status(), None);
        assert_eq!(reply(220, &[]).enhanced_status(), None);
    }
}
