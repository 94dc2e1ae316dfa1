//! SMTP session controller.
//!
//! Drives one logical connection across a batch of messages. Every reply is
//! classified into continue, skip this message, abort this message, or end
//! the batch:
//!
//! ```text
//! Disconnected ── connect ──→ Connected ──→ [SecureNegotiated] ──→ [Authenticated]
//!       ↑                                                               │
//!       └──── DATA transport failure / 421 at DATA / disconnect policy ─┘
//! ```
//!
//! Forward transitions happen only inside [`Session::connect`]. A fatal error
//! closes the transport before it is returned.

use crate::config::{ConnectionConfig, Credentials, DisconnectPolicy, RecipientPolicy, TlsPolicy};
use crate::envelope::Envelope;
use crate::error::{Error, Result, Stage};
use crate::outcome::Outcome;
use smtpbatch_smtp::{AuthMechanism, ReplyCode, ServerInfo, Transport};
use tracing::{debug, info, warn};

/// Connection progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No open connection.
    Disconnected,
    /// Greeted and EHLO accepted.
    Connected,
    /// STARTTLS completed and EHLO re-issued.
    SecureNegotiated,
    /// AUTH accepted.
    Authenticated,
}

/// One SMTP session over a transport.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    state: SessionState,
    server_info: ServerInfo,
}

impl<T: Transport> Session<T> {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: SessionState::Disconnected,
            server_info: ServerInfo::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true unless the session is [`SessionState::Disconnected`].
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state != SessionState::Disconnected
    }

    /// Capabilities from the most recent EHLO.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Establishes the session unless it is already connected.
    ///
    /// Greeting, EHLO, optional STARTTLS with a second EHLO, optional AUTH,
    /// in that order.
    ///
    /// # Errors
    ///
    /// Any failure or refusal at any step is fatal; the transport is closed
    /// before the error is returned.
    pub async fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        match self.establish(config).await {
            Ok(()) => {
                info!(
                    server = %config.server,
                    port = config.port,
                    state = ?self.state,
                    "session established"
                );
                Ok(())
            }
            Err(e) => {
                self.reset().await;
                Err(e)
            }
        }
    }

    async fn establish(&mut self, config: &ConnectionConfig) -> Result<()> {
        let greeting = self
            .transport
            .open(&config.server, config.port)
            .await
            .map_err(|source| Error::Transport {
                stage: Stage::Connect,
                source,
            })?;
        if !greeting.is(ReplyCode::SERVICE_READY) {
            return Err(Error::Rejected {
                stage: Stage::Connect,
                reply: greeting,
            });
        }
        debug!(greeting = %greeting, "connected");
        self.state = SessionState::Connected;

        self.ehlo(&config.helo).await?;

        let offered = self.server_info.supports_starttls();
        match (config.tls, offered) {
            (TlsPolicy::Mandatory, false) => return Err(Error::StartTlsNotOffered),
            (TlsPolicy::Mandatory | TlsPolicy::Opportunistic, true) => {
                self.starttls(config).await?;
            }
            (TlsPolicy::Opportunistic, false) => {
                debug!("STARTTLS not offered, continuing without TLS");
            }
            (TlsPolicy::None, _) => {}
        }

        if let Some(credentials) = &config.credentials {
            self.authenticate(credentials).await?;
        }
        Ok(())
    }

    async fn ehlo(&mut self, helo: &str) -> Result<()> {
        let reply = self
            .transport
            .ehlo(helo)
            .await
            .map_err(|source| Error::Transport {
                stage: Stage::Ehlo,
                source,
            })?;
        if !reply.is(ReplyCode::OK) {
            return Err(Error::Rejected {
                stage: Stage::Ehlo,
                reply,
            });
        }
        self.server_info = ServerInfo::from_ehlo(&reply);
        Ok(())
    }

    async fn starttls(&mut self, config: &ConnectionConfig) -> Result<()> {
        let reply = self
            .transport
            .starttls(&config.server)
            .await
            .map_err(|source| Error::Transport {
                stage: Stage::StartTls,
                source,
            })?;
        if !reply.is(ReplyCode::SERVICE_READY) {
            return Err(Error::Rejected {
                stage: Stage::StartTls,
                reply,
            });
        }

        // Capabilities announced before the upgrade cannot be trusted.
        self.server_info = ServerInfo::default();
        self.ehlo(&config.helo).await?;
        self.state = SessionState::SecureNegotiated;
        debug!("STARTTLS negotiated");
        Ok(())
    }

    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let advertised = self.server_info.auth_mechanisms();
        let mechanism = [AuthMechanism::Plain, AuthMechanism::Login]
            .into_iter()
            .find(|m| advertised.contains(m))
            .ok_or(Error::NoAuthMechanism)?;

        let reply = self
            .transport
            .auth(mechanism, &credentials.username, &credentials.password)
            .await
            .map_err(|source| Error::Transport {
                stage: Stage::Auth,
                source,
            })?;
        if !reply.is(ReplyCode::AUTH_SUCCESS) {
            return Err(Error::Rejected {
                stage: Stage::Auth,
                reply,
            });
        }

        self.state = SessionState::Authenticated;
        debug!(%mechanism, username = %credentials.username, "authenticated");
        Ok(())
    }

    /// Runs the envelope and content exchange for one message.
    ///
    /// # Errors
    ///
    /// A transport failure at MAIL FROM, RCPT TO or RSET is fatal for the
    /// batch; the transport is closed first. Rejections and DATA-phase
    /// failures are reported through the returned [`Outcome`].
    pub async fn send_message(
        &mut self,
        envelope: &Envelope,
        content: &[u8],
        policy: RecipientPolicy,
    ) -> Result<Outcome> {
        let size = self.server_info.supports_size().then_some(content.len());
        let reply = match self.transport.mail_from(&envelope.sender, size).await {
            Ok(reply) => reply,
            Err(source) => return Err(self.fatal(Stage::MailFrom, source).await),
        };
        if !reply.is(ReplyCode::OK) {
            warn!(
                sender = %envelope.sender,
                status = reply.enhanced_status(),
                %reply,
                "sender rejected"
            );
            return Ok(Outcome::SkippedRejectedAtEnvelope { reply });
        }

        let mut accepted = 0_usize;
        let mut last_rejection = None;
        for recipient in &envelope.recipients {
            let reply = match self.transport.rcpt_to(recipient).await {
                Ok(reply) => reply,
                Err(source) => return Err(self.fatal(Stage::RcptTo, source).await),
            };

            if reply.is(ReplyCode::OK) || reply.is(ReplyCode::FORWARD) {
                accepted += 1;
                continue;
            }

            warn!(
                %recipient,
                status = reply.enhanced_status(),
                %reply,
                "recipient rejected"
            );
            if policy == RecipientPolicy::AbortOnAnyRejection {
                self.reset_envelope().await?;
                return Ok(Outcome::AbortedAtRecipient {
                    recipient: recipient.clone(),
                    reply,
                });
            }
            last_rejection = Some(reply);
        }

        if accepted == 0 {
            self.reset_envelope().await?;
            // An empty envelope never reached RCPT; anything else was refused.
            return Ok(last_rejection.map_or(Outcome::SkippedNoRecipients, |reply| {
                Outcome::SkippedRejectedAtEnvelope { reply }
            }));
        }

        Ok(self.send_content(content).await)
    }

    async fn send_content(&mut self, content: &[u8]) -> Outcome {
        match self.transport.data(content).await {
            Ok(reply) if reply.is(ReplyCode::OK) => {
                info!(%reply, "message accepted");
                Outcome::Sent
            }
            Ok(reply) => {
                warn!(status = reply.enhanced_status(), %reply, "message rejected at DATA");
                if reply.is(ReplyCode::SERVICE_UNAVAILABLE) {
                    self.reset().await;
                }
                Outcome::RejectedAtData { reply }
            }
            Err(e) => {
                warn!(error = %e, "connection failed during DATA, will reconnect");
                self.reset().await;
                Outcome::DataTransportFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Clears server-side envelope state after an abandoned transaction.
    async fn reset_envelope(&mut self) -> Result<()> {
        match self.transport.rset().await {
            Ok(reply) if reply.is(ReplyCode::OK) => Ok(()),
            Ok(reply) => {
                warn!(%reply, "RSET not accepted");
                Ok(())
            }
            Err(source) => Err(self.fatal(Stage::Rset, source).await),
        }
    }

    /// Applies the disconnect policy after a message.
    ///
    /// With [`DisconnectPolicy::AfterEachMessage`] the session sends QUIT and
    /// closes the connection whatever QUIT's outcome.
    pub async fn disconnect_if_requested(&mut self, policy: DisconnectPolicy) {
        if policy == DisconnectPolicy::AfterEachMessage {
            self.quit().await;
        }
    }

    /// Sends QUIT if connected, then closes. QUIT failures are only logged.
    pub async fn quit(&mut self) {
        if !self.is_connected() {
            return;
        }
        match self.transport.quit().await {
            Ok(reply) if reply.is(ReplyCode::CLOSING) => debug!(%reply, "QUIT accepted"),
            Ok(reply) => warn!(%reply, "unexpected QUIT reply"),
            Err(e) => warn!(error = %e, "QUIT failed"),
        }
        self.reset().await;
    }

    async fn fatal(&mut self, stage: Stage, source: smtpbatch_smtp::Error) -> Error {
        self.reset().await;
        Error::Transport { stage, source }
    }

    /// Closes the transport and forgets everything learned about the server.
    async fn reset(&mut self) {
        self.transport.close().await;
        self.state = SessionState::Disconnected;
        self.server_info = ServerInfo::default();
    }
}

