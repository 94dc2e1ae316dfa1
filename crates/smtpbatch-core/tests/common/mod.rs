//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::path::PathBuf;

use smtpbatch_core::{BatchConfig, ConnectionConfig, SenderSource};
use smtpbatch_smtp::{Address, AuthMechanism, Error, Reply, ReplyCode, Transport};

/// One scripted answer.
pub enum Step {
    Reply(Reply),
    Fail,
}

/// Plays back a script of answers and records every command it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    script: VecDeque<Step>,
    pub log: Vec<String>,
    open: bool,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Number of logged commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.log.iter().filter(|l| l.starts_with(prefix)).count()
    }

    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }

    fn answer(&mut self, command: String) -> Result<Reply, Error> {
        let step = self
            .script
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted command: {command}"));
        self.log.push(command);
        match step {
            Step::Reply(reply) => Ok(reply),
            Step::Fail => Err(Error::ConnectionClosed),
        }
    }
}

impl Transport for ScriptedTransport {
    async fn open(&mut self, host: &str, port: u16) -> Result<Reply, Error> {
        let reply = self.answer(format!("OPEN {host}:{port}"))?;
        self.open = true;
        Ok(reply)
    }

    async fn ehlo(&mut self, hostname: &str) -> Result<Reply, Error> {
        self.answer(format!("EHLO {hostname}"))
    }

    async fn starttls(&mut self, server_name: &str) -> Result<Reply, Error> {
        self.answer(format!("STARTTLS {server_name}"))
    }

    async fn auth(
        &mut self,
        mechanism: AuthMechanism,
        username: &str,
        _password: &str,
    ) -> Result<Reply, Error> {
        self.answer(format!("AUTH {mechanism} {username}"))
    }

    async fn mail_from(&mut self, from: &Address, size: Option<usize>) -> Result<Reply, Error> {
        match size {
            Some(size) => self.answer(format!("MAIL {from} SIZE={size}")),
            None => self.answer(format!("MAIL {from}")),
        }
    }

    async fn rcpt_to(&mut self, to: &Address) -> Result<Reply, Error> {
        self.answer(format!("RCPT {to}"))
    }

    async fn data(&mut self, _content: &[u8]) -> Result<Reply, Error> {
        self.answer("DATA".to_string())
    }

    async fn rset(&mut self) -> Result<Reply, Error> {
        self.answer("RSET".to_string())
    }

    async fn quit(&mut self) -> Result<Reply, Error> {
        self.answer("QUIT".to_string())
    }

    async fn close(&mut self) {
        if self.open {
            self.log.push("CLOSE".to_string());
            self.open = false;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

pub fn reply(code: u16, text: &str) -> Step {
    Step::Reply(Reply::new(ReplyCode::new(code), vec![text.to_string()]))
}

pub fn ok() -> Step {
    reply(250, "OK")
}

pub fn fail() -> Step {
    Step::Fail
}

pub fn greeting() -> Step {
    reply(220, "mx.test ESMTP")
}

/// A 250 EHLO reply advertising `extensions`.
pub fn ehlo(extensions: &[&str]) -> Step {
    let mut lines = vec!["mx.test".to_string()];
    lines.extend(extensions.iter().map(ToString::to_string));
    Step::Reply(Reply::new(ReplyCode::OK, lines))
}

pub fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

pub fn connection() -> ConnectionConfig {
    ConnectionConfig::new("mx.test", "client.test")
}

pub fn batch_config() -> BatchConfig {
    let mut config = BatchConfig::new(connection(), SenderSource::Explicit(addr("from@test")));
    config.extra_recipients = vec![addr("to@test")];
    config
}

/// A message file comfortably above the plausibility threshold.
pub fn message(headers: &str) -> Vec<u8> {
    let mut content = headers.as_bytes().to_vec();
    content.extend_from_slice(b"Subject: batch test\n\n");
    content.extend_from_slice("Body line that pads the message.\n".repeat(4).as_bytes());
    content
}

pub fn write_files(dir: &tempfile::TempDir, contents: &[Vec<u8>]) -> Vec<PathBuf> {
    contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let path = dir.path().join(format!("{i}.eml"));
            std::fs::write(&path, content).unwrap();
            path
        })
        .collect()
}
