//! `smtpbatch` - submit pre-formed messages to an SMTP server.
//!
//! Each file is sent as one message over a single reused connection.
//! Exit status is 0 when the batch ran to the end (even if some messages
//! were skipped), 1 on a fatal error and 2 on invalid arguments.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser, ValueEnum};
use smtpbatch_core::{
    BatchConfig, BatchReport, ConfigError, ConnectionConfig, Credentials, DisconnectPolicy,
    RecipientPolicy, SenderSource, Session, TlsPolicy, config::DEFAULT_PORT, run_batch,
};
use smtpbatch_smtp::{Address, SmtpClient};
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "smtpbatch=info,smtpbatch_core=info,smtpbatch_smtp=info";
const DEBUG_FILTER: &str = "smtpbatch=trace,smtpbatch_core=trace,smtpbatch_smtp=trace";

/// Submit a batch of message files to an SMTP server
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
#[command(group(ArgGroup::new("sender").required(true).args(["from", "from_header"])))]
struct Cli {
    /// Mail server host name or address
    #[arg(long)]
    server: String,

    /// Mail server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Name to announce with EHLO; defaults to the local host name
    #[arg(long)]
    helo: Option<String>,

    /// Envelope sender for every message
    #[arg(long)]
    from: Option<Address>,

    /// Take the envelope sender from each message's From header
    #[arg(long)]
    from_header: bool,

    /// Recipient added to every message; repeatable, comma separated lists
    /// are accepted
    #[arg(long, value_delimiter = ',')]
    to: Vec<Address>,

    /// Take recipients from the To, Cc and Bcc headers
    #[arg(long)]
    header_recipients: bool,

    /// STARTTLS policy
    #[arg(long, value_enum, default_value_t = TlsArg::None)]
    tls: TlsArg,

    /// Username for SMTP AUTH
    #[arg(long)]
    user: Option<String>,

    /// Password for SMTP AUTH
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Abandon a message as soon as one of its recipients is rejected
    #[arg(long)]
    abort_on_reject: bool,

    /// QUIT and reconnect between messages
    #[arg(long)]
    disconnect: bool,

    /// Send files byte for byte, without line ending normalization
    #[arg(long)]
    binary: bool,

    /// Timeout in seconds for each network operation
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Log the full protocol conversation
    #[arg(long)]
    debug: bool,

    /// Message files to send, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TlsArg {
    /// Never use STARTTLS
    None,
    /// Use STARTTLS when the server offers it
    Opportunistic,
    /// Refuse to send unless STARTTLS succeeds
    Mandatory,
}

impl From<TlsArg> for TlsPolicy {
    fn from(arg: TlsArg) -> Self {
        match arg {
            TlsArg::None => Self::None,
            TlsArg::Opportunistic => Self::Opportunistic,
            TlsArg::Mandatory => Self::Mandatory,
        }
    }
}

impl Cli {
    fn to_config(&self) -> Result<BatchConfig, ConfigError> {
        let sender = SenderSource::from_options(self.from.clone(), self.from_header)?;
        let credentials = Credentials::from_options(self.user.clone(), self.password.clone())?;
        if credentials.as_ref().is_some_and(|c| c.password.is_empty()) {
            warn!("no password given, authenticating with an empty password");
        }

        let helo = self.helo.clone().unwrap_or_else(local_hostname);
        let mut connection = ConnectionConfig::new(&self.server, helo);
        connection.port = self.port;
        connection.tls = self.tls.into();
        connection.credentials = credentials;
        connection.timeout = Duration::from_secs(self.timeout);

        let mut config = BatchConfig::new(connection, sender);
        config.header_recipients = self.header_recipients;
        config.extra_recipients.clone_from(&self.to);
        if self.abort_on_reject {
            config.recipient_policy = RecipientPolicy::AbortOnAnyRejection;
        }
        if self.disconnect {
            config.disconnect_policy = DisconnectPolicy::AfterEachMessage;
        }
        config.normalize_line_endings = !self.binary;

        config.validate()?;
        Ok(config)
    }
}

fn local_hostname() -> String {
    let name = gethostname::gethostname().to_string_lossy().into_owned();
    if name.is_empty() {
        "localhost".to_string()
    } else {
        name
    }
}

fn init_logging(debug: bool) {
    let default = if debug { DEBUG_FILTER } else { DEFAULT_FILTER };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(config: &BatchConfig, files: &[PathBuf]) -> anyhow::Result<BatchReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;

    let mut session = Session::new(SmtpClient::new(config.connection.timeout));
    let report = runtime.block_on(run_batch(&mut session, config, files))?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => Cli::command().error(ErrorKind::ArgumentConflict, e).exit(),
    };

    match run(&config, &cli.files) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("smtpbatch").chain(args.split_whitespace()))
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn minimal_invocation() {
        let cli = parse(
            "--server mx.example.com --from a@example.com --to b@example.com msg.eml",
        )
        .unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.connection.port, 25);
        assert_eq!(config.connection.tls, TlsPolicy::None);
        assert_eq!(config.connection.timeout, Duration::from_secs(60));
        assert!(config.connection.credentials.is_none());
        assert!(!config.connection.helo.is_empty());
        assert!(config.normalize_line_endings);
        assert_eq!(config.recipient_policy, RecipientPolicy::SkipRejected);
        assert_eq!(config.disconnect_policy, DisconnectPolicy::KeepAlive);
    }

    #[test]
    fn sender_sources_are_exclusive() {
        let err = parse(
            "--server mx --from a@example.com --from-header --to b@example.com m",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let err = parse("--server mx --to b@example.com m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn recipient_source_required() {
        let cli = parse("--server mx --from-header m").unwrap();
        assert_eq!(cli.to_config().unwrap_err(), ConfigError::NoRecipientSource);
    }

    #[test]
    fn password_without_user_rejected() {
        let cli = parse("--server mx --from-header --header-recipients --password pw m").unwrap();
        assert_eq!(
            cli.to_config().unwrap_err(),
            ConfigError::PasswordWithoutUsername
        );
    }

    #[test]
    fn comma_separated_recipients() {
        let cli = parse(
            "--server mx --from-header --to a@example.com,b@example.com --to c@example.com m",
        )
        .unwrap();
        let config = cli.to_config().unwrap();
        let to: Vec<_> = config.extra_recipients.iter().map(Address::as_str).collect();
        assert_eq!(to, ["a@example.com", "b@example.com", "c@example.com"]);
    }

    #[test]
    fn invalid_address_is_a_usage_error() {
        let err = parse("--server mx --from not-an-address --to b@example.com m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn full_option_set() {
        let cli = parse(
            "--server mx --port 587 --helo me.example.com --from-header --header-recipients \
             --tls mandatory --user me --password pw --abort-on-reject --disconnect --binary \
             --timeout 5 a.eml b.eml",
        )
        .unwrap();
        let config = cli.to_config().unwrap();

        assert_eq!(config.connection.port, 587);
        assert_eq!(config.connection.helo, "me.example.com");
        assert_eq!(config.connection.tls, TlsPolicy::Mandatory);
        assert_eq!(config.connection.credentials.unwrap().username, "me");
        assert_eq!(config.connection.timeout, Duration::from_secs(5));
        assert_eq!(config.sender, SenderSource::FromHeader);
        assert_eq!(config.recipient_policy, RecipientPolicy::AbortOnAnyRejection);
        assert_eq!(config.disconnect_policy, DisconnectPolicy::AfterEachMessage);
        assert!(!config.normalize_line_endings);
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = parse("--server mx --from-header --header-recipients --timeout 0 m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn files_required() {
        let err = parse("--server mx --from-header --header-recipients").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
