//! # smtpbatch-smtp
//!
//! SMTP transport used by `smtpbatch`: command serialization, reply parsing,
//! STARTTLS and SASL authentication over tokio.
//!
//! Unlike a high-level mail sender, the client here never turns a reply code
//! into an error. Each command yields either the server's [`Reply`] or a
//! transport [`Error`] (I/O, TLS, timeout, malformed reply), so the caller can
//! decide per code whether to continue, skip, or give up.
//!
//! ```ignore
//! use smtpbatch_smtp::{Address, ReplyCode, SmtpClient, Transport};
//! use std::time::Duration;
//!
//! let mut client = SmtpClient::new(Duration::from_secs(60));
//! let greeting = client.open("smtp.example.com", 25).await?;
//! let ehlo = client.ehlo("client.example.com").await?;
//! let reply = client.mail_from(&Address::new("a@example.com")?, None).await?;
//! if reply.is(ReplyCode::OK) {
//!     // RCPT TO, DATA ...
//! }
//! client.quit().await?;
//! client.close().await;
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders and DATA encoding
//! - [`connection`]: streams and the [`SmtpClient`]
//! - [`parser`]: reply parser
//! - [`transport`]: the [`Transport`] trait
//! - [`types`]: addresses, extensions, replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod transport;
pub mod types;

pub use connection::{ServerInfo, SmtpClient};
pub use error::{Error, Result};
pub use transport::Transport;
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
