//! # smtpbatch-core
//!
//! Core logic for `smtpbatch`, which submits pre-formed messages to an SMTP
//! server from a batch of files.
//!
//! This crate provides:
//! - The SMTP [`Session`] controller (connect, STARTTLS, AUTH, per-message
//!   envelope and content exchange)
//! - Envelope resolution from configuration and message headers
//! - The message [`source`] (file reading, header address extraction)
//! - The batch runner [`run_batch`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod batch;
pub mod config;
mod envelope;
mod error;
mod outcome;
pub mod session;
pub mod source;

pub use batch::run_batch;
pub use config::{
    BatchConfig, ConfigError, ConnectionConfig, Credentials, DisconnectPolicy, RecipientPolicy,
    SenderSource, TlsPolicy,
};
pub use envelope::{Envelope, EnvelopeError};
pub use error::{Error, Result, Stage};
pub use outcome::{BatchReport, Outcome};
pub use session::{Session, SessionState};
