//! Reply parser.
//!
//! SMTP replies can be single-line or multi-line:
//! - Single: `250 OK\r\n`
//! - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`
//!
//! Lines are fed one at a time into [`ReplyBuilder`]; it yields the complete
//! [`Reply`] once the final line (separator `' '`) has been seen.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Accumulates reply lines until the reply is complete.
#[derive(Debug, Default)]
pub struct ReplyBuilder {
    code: Option<ReplyCode>,
    lines: Vec<String>,
}

impl ReplyBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line (without its line terminator).
    ///
    /// Returns `Ok(Some(reply))` when `line` was the last line of the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is malformed or its code differs from
    /// the code of earlier lines in the same reply.
    pub fn push(&mut self, line: &str) -> Result<Option<Reply>> {
        let (code, last, text) = split_line(line)?;

        match self.code {
            Some(expected) if expected != code => {
                return Err(Error::Protocol(format!(
                    "Reply code changed mid-reply: {expected} then {code}"
                )));
            }
            Some(_) => {}
            None => self.code = Some(code),
        }
        self.lines.push(text.to_string());

        if last {
            let lines = std::mem::take(&mut self.lines);
            self.code = None;
            Ok(Some(Reply::new(code, lines)))
        } else {
            Ok(None)
        }
    }
}

/// Splits a reply line into code, final-line flag and text.
fn split_line(line: &str) -> Result<(ReplyCode, bool, &str)> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("Invalid reply line: {line:?}")))?;
    let code = digits
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {digits}")))?;

    // A bare "250" is a complete single-line reply with no text.
    match line.as_bytes().get(3) {
        None => Ok((ReplyCode::new(code), true, "")),
        Some(b' ') => Ok((ReplyCode::new(code), true, &line[4..])),
        Some(b'-') => Ok((ReplyCode::new(code), false, &line[4..])),
        Some(_) => Err(Error::Protocol(format!("Malformed reply line: {line:?}"))),
    }
}
