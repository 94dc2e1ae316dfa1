//! Resolved run configuration.
//!
//! The command-line layer parses flags; this module owns the types they are
//! turned into and the pre-flight checks that must pass before any network
//! activity.

use smtpbatch_smtp::Address;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default SMTP port.
pub const DEFAULT_PORT: u16 = 25;

/// Default bound on every transport operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration problems, all detected before connecting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `--from` nor `--from-header` was given.
    #[error("a sender is required: give either an explicit sender or derive it from the From header")]
    NoSenderSource,

    /// Both sender sources were given.
    #[error("an explicit sender and a From-header sender are mutually exclusive")]
    ConflictingSenderSource,

    /// No explicit recipients and header recipients disabled.
    #[error("no recipient source: give explicit recipients or derive them from the headers")]
    NoRecipientSource,

    /// Password given without a username.
    #[error("a password was given without a username")]
    PasswordWithoutUsername,

    /// Server host is empty.
    #[error("server address must not be empty")]
    EmptyServer,
}

/// STARTTLS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    /// Never upgrade.
    #[default]
    None,
    /// Upgrade if the server offers STARTTLS.
    Opportunistic,
    /// Refuse to continue unless the server offers STARTTLS.
    Mandatory,
}

/// What to do with a message when one of its recipients is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipientPolicy {
    /// Send to the recipients that were accepted.
    #[default]
    SkipRejected,
    /// Abandon the message on the first rejection.
    AbortOnAnyRejection,
}

/// Whether to keep the connection across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectPolicy {
    /// Reuse one connection for the whole batch.
    #[default]
    KeepAlive,
    /// QUIT and reconnect between messages.
    AfterEachMessage,
}

/// Login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username.
    pub username: String,
    /// Password (may be empty).
    pub password: String,
}

impl Credentials {
    /// Builds credentials from the optional username and password options.
    ///
    /// Returns `Ok(None)` when neither is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PasswordWithoutUsername`] for a password with no
    /// username.
    pub fn from_options(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        match (username, password) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ConfigError::PasswordWithoutUsername),
            (Some(username), password) => Ok(Some(Self {
                username,
                password: password.unwrap_or_default(),
            })),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the envelope sender comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderSource {
    /// The same address for every message.
    Explicit(Address),
    /// The first address of each message's `From` header.
    FromHeader,
}

impl SenderSource {
    /// Picks the sender source; exactly one method must be selected.
    ///
    /// # Errors
    ///
    /// Returns an error when none or both are selected.
    pub fn from_options(explicit: Option<Address>, from_header: bool) -> Result<Self, ConfigError> {
        match (explicit, from_header) {
            (Some(address), false) => Ok(Self::Explicit(address)),
            (None, true) => Ok(Self::FromHeader),
            (None, false) => Err(ConfigError::NoSenderSource),
            (Some(_), true) => Err(ConfigError::ConflictingSenderSource),
        }
    }
}

/// Everything needed to establish a session.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server host name or address.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Name sent with EHLO.
    pub helo: String,
    /// STARTTLS policy.
    pub tls: TlsPolicy,
    /// Credentials, if authentication is wanted.
    pub credentials: Option<Credentials>,
    /// Bound on each transport operation.
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Creates a configuration with default port, no TLS and no credentials.
    #[must_use]
    pub fn new(server: impl Into<String>, helo: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: DEFAULT_PORT,
            helo: helo.into(),
            tls: TlsPolicy::default(),
            credentials: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Full configuration for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Connection settings.
    pub connection: ConnectionConfig,
    /// Envelope sender source.
    pub sender: SenderSource,
    /// Take recipients from `To`, `Cc` and `Bcc`.
    pub header_recipients: bool,
    /// Recipients added to every message, after header recipients.
    pub extra_recipients: Vec<Address>,
    /// Reaction to rejected recipients.
    pub recipient_policy: RecipientPolicy,
    /// Reconnect policy.
    pub disconnect_policy: DisconnectPolicy,
    /// Convert CRLF and lone CR to LF when reading messages.
    pub normalize_line_endings: bool,
}

impl BatchConfig {
    /// Creates a configuration with default policies.
    #[must_use]
    pub fn new(connection: ConnectionConfig, sender: SenderSource) -> Self {
        Self {
            connection,
            sender,
            header_recipients: false,
            extra_recipients: Vec::new(),
            recipient_policy: RecipientPolicy::default(),
            disconnect_policy: DisconnectPolicy::default(),
            normalize_line_endings: true,
        }
    }

    /// Checks the rules that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.server.trim().is_empty() {
            return Err(ConfigError::EmptyServer);
        }
        if !self.header_recipients && self.extra_recipients.is_empty() {
            return Err(ConfigError::NoRecipientSource);
        }
        Ok(())
    }

    /// Returns true if message headers must be parsed at all.
    #[must_use]
    pub fn needs_headers(&self) -> bool {
        self.header_recipients || self.sender == SenderSource::FromHeader
    }
}
