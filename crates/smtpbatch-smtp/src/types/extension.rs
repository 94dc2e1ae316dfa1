//! EHLO keywords.

use std::fmt;
use std::str::FromStr;

/// One service extension advertised in an EHLO reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// `STARTTLS`
    StartTls,
    /// `AUTH` with the mechanisms this client can use.
    Auth(Vec<AuthMechanism>),
    /// `SIZE`, with the declared limit if any.
    Size(Option<usize>),
    /// Any other keyword, upper-cased, parameters dropped.
    Other(String),
}

impl Extension {
    /// Parses one EHLO line after the greeting line.
    ///
    /// `AUTH=PLAIN LOGIN`, the pre-standard spelling, is accepted too.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line
            .split(|c: char| c.is_whitespace() || c == '=')
            .filter(|w| !w.is_empty());
        let keyword = words.next().unwrap_or_default().to_ascii_uppercase();

        match keyword.as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(words.filter_map(|w| w.parse().ok()).collect()),
            "SIZE" => Self::Size(words.next().and_then(|n| n.parse().ok())),
            _ => Self::Other(keyword),
        }
    }
}

/// SASL mechanisms the client implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN, credentials in the initial response.
    Plain,
    /// LOGIN, username and password as two challenges.
    Login,
}

impl AuthMechanism {
    /// Name as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

impl FromStr for AuthMechanism {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("PLAIN") {
            Ok(Self::Plain)
        } else if s.eq_ignore_ascii_case("LOGIN") {
            Ok(Self::Login)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
