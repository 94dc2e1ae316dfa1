//! SMTP client speaking the wire protocol.

use super::stream::{self, SmtpStream};
use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::parser::ReplyBuilder;
use crate::transport::Transport;
use crate::types::{Address, AuthMechanism, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::time::Duration;
use tracing::{debug, trace};

/// SMTP client over TCP, upgradable with STARTTLS.
///
/// Holds at most one open connection. Replies are returned as values; only
/// failures to complete an exchange are errors.
#[derive(Debug)]
pub struct SmtpClient {
    stream: Option<SmtpStream>,
    timeout: Duration,
}

impl SmtpClient {
    /// Creates a disconnected client whose every I/O step is bounded by `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            stream: None,
            timeout,
        }
    }

    fn stream_mut(&mut self) -> Result<&mut SmtpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }

    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        trace!("C: {}", cmd.redacted());
        self.stream_mut()?.write_all(&cmd.serialize()).await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let stream = self.stream_mut()?;
        let mut builder = ReplyBuilder::new();
        loop {
            let line = stream.read_line().await?;
            trace!("S: {line}");
            if let Some(reply) = builder.push(&line)? {
                return Ok(reply);
            }
        }
    }

    async fn auth_login(&mut self, username: &str, password: &str) -> Result<Reply> {
        let cmd = Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        };
        let reply = self.send_command(&cmd).await?;
        if !reply.is(ReplyCode::AUTH_CONTINUE) {
            return Ok(reply);
        }

        let reply = self
            .send_command(&Command::AuthResponse(BASE64.encode(username)))
            .await?;
        if !reply.is(ReplyCode::AUTH_CONTINUE) {
            return Ok(reply);
        }

        self.send_command(&Command::AuthResponse(BASE64.encode(password)))
            .await
    }
}

impl Transport for SmtpClient {
    async fn open(&mut self, host: &str, port: u16) -> Result<Reply> {
        self.close().await;
        debug!(host, port, "connecting");
        self.stream = Some(stream::connect(host, port, self.timeout).await?);
        self.read_reply().await
    }

    async fn ehlo(&mut self, hostname: &str) -> Result<Reply> {
        let cmd = Command::Ehlo {
            hostname: hostname.to_string(),
        };
        self.send_command(&cmd).await
    }

    async fn starttls(&mut self, server_name: &str) -> Result<Reply> {
        let reply = self.send_command(&Command::StartTls).await?;
        if !reply.is(ReplyCode::SERVICE_READY) {
            return Ok(reply);
        }

        // A failed handshake leaves nothing usable behind.
        let plain = self.stream.take().ok_or(Error::NotConnected)?;
        self.stream = Some(plain.upgrade_to_tls(server_name).await?);
        debug!(server_name, "TLS established");
        Ok(reply)
    }

    async fn auth(
        &mut self,
        mechanism: AuthMechanism,
        username: &str,
        password: &str,
    ) -> Result<Reply> {
        match mechanism {
            AuthMechanism::Plain => {
                let credentials = format!("\0{username}\0{password}");
                let cmd = Command::Auth {
                    mechanism,
                    initial_response: Some(BASE64.encode(credentials.as_bytes())),
                };
                self.send_command(&cmd).await
            }
            AuthMechanism::Login => self.auth_login(username, password).await,
        }
    }

    async fn mail_from(&mut self, from: &Address, size: Option<usize>) -> Result<Reply> {
        let cmd = Command::MailFrom {
            from: from.clone(),
            size,
        };
        self.send_command(&cmd).await
    }

    async fn rcpt_to(&mut self, to: &Address) -> Result<Reply> {
        self.send_command(&Command::RcptTo { to: to.clone() }).await
    }

    async fn data(&mut self, content: &[u8]) -> Result<Reply> {
        let reply = self.send_command(&Command::Data).await?;
        if !reply.is(ReplyCode::START_DATA) {
            return Ok(reply);
        }

        let payload = encode_data(content);
        trace!("C: <{} bytes of message data>", payload.len());
        self.stream_mut()?.write_all(&payload).await?;
        self.read_reply().await
    }

    async fn rset(&mut self) -> Result<Reply> {
        self.send_command(&Command::Rset).await
    }

    async fn quit(&mut self) -> Result<Reply> {
        self.send_command(&Command::Quit).await
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await;
            debug!("connection closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}
