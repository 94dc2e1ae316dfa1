//! The transport seam between the session controller and the wire.

use crate::error::Result;
use crate::types::{Address, AuthMechanism, Reply};

/// One SMTP connection, driven one command at a time.
///
/// Every operation either yields the server's [`Reply`], whatever its code,
/// or fails with a transport [`Error`](crate::Error). Interpreting reply
/// codes is left entirely to the caller.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Opens a connection to `host:port` and returns the server greeting.
    ///
    /// Any previously open connection is closed first.
    async fn open(&mut self, host: &str, port: u16) -> Result<Reply>;

    /// Sends `EHLO hostname`.
    async fn ehlo(&mut self, hostname: &str) -> Result<Reply>;

    /// Sends `STARTTLS` and, if the server answers 220, performs the TLS
    /// handshake verifying the certificate against `server_name`.
    ///
    /// The returned reply is the answer to `STARTTLS` itself.
    async fn starttls(&mut self, server_name: &str) -> Result<Reply>;

    /// Runs the complete SASL exchange for `mechanism` and returns the final reply.
    async fn auth(&mut self, mechanism: AuthMechanism, username: &str, password: &str)
    -> Result<Reply>;

    /// Sends `MAIL FROM:<from>`, with `SIZE=` when `size` is given.
    async fn mail_from(&mut self, from: &Address, size: Option<usize>) -> Result<Reply>;

    /// Sends `RCPT TO:<to>`.
    async fn rcpt_to(&mut self, to: &Address) -> Result<Reply>;

    /// Sends `DATA`; on 354 transmits `content` and returns the final reply,
    /// otherwise returns the reply to `DATA`.
    async fn data(&mut self, content: &[u8]) -> Result<Reply>;

    /// Sends `RSET`.
    async fn rset(&mut self) -> Result<Reply>;

    /// Sends `QUIT`. The connection stays open until [`close`](Self::close).
    async fn quit(&mut self) -> Result<Reply>;

    /// Closes the connection. Never fails; closing a closed transport is a no-op.
    async fn close(&mut self);

    /// Returns true while a connection is open.
    fn is_open(&self) -> bool;
}
