//! End-to-end batch runs over message files and a scripted transport.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use smtpbatch_core::{
    DisconnectPolicy, Error, Outcome, SenderSource, Session, Stage, TlsPolicy, run_batch,
};

#[tokio::test]
async fn one_connection_for_whole_batch() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(&dir, &[message(""), message("")]);
    let mut config = batch_config();
    config.connection.tls = TlsPolicy::Mandatory;

    let mut session = Session::new(ScriptedTransport::new(vec![
        greeting(),
        ehlo(&["STARTTLS"]),
        reply(220, "ready"),
        ehlo(&[]),
        ok(),
        ok(),
        ok(),
        ok(),
        ok(),
        ok(),
        reply(221, "bye"),
    ]));

    let report = run_batch(&mut session, &config, &files).await.unwrap();

    assert_eq!(report.sent(), 2);
    assert_eq!(report.not_sent(), 0);
    let t = session.transport();
    assert_eq!(t.count("OPEN"), 1);
    assert_eq!(t.count("STARTTLS"), 1);
    assert_eq!(t.count("DATA"), 2);
    assert_eq!(&t.log[t.log.len() - 2..], &["QUIT", "CLOSE"]);
    assert!(t.is_exhausted());
}

#[tokio::test]
async fn rejected_recipients_skip_message_but_not_batch() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(&dir, &[message(""), message("")]);
    let mut config = batch_config();
    config.extra_recipients.push(addr("other@test"));

    let mut session = Session::new(ScriptedTransport::new(vec![
        greeting(),
        ehlo(&[]),
        // first message: both recipients refused
        ok(),
        reply(550, "unknown"),
        reply(550, "unknown"),
        ok(),
        // second message goes through
        ok(),
        ok(),
        ok(),
        ok(),
        reply(221, "bye"),
    ]));

    let report = run_batch(&mut session, &config, &files).await.unwrap();

    assert!(matches!(
        report.outcomes[0].1,
        Outcome::SkippedRejectedAtEnvelope { .. }
    ));
    assert_eq!(report.outcomes[1].1, Outcome::Sent);
    assert_eq!(session.transport().count("DATA"), 1);
}

#[tokio::test]
async fn fatal_error_stops_batch() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(&dir, &[message(""), message("")]);

    let mut session = Session::new(ScriptedTransport::new(vec![
        greeting(),
        ehlo(&[]),
        fail(),
    ]));

    let err = run_batch(&mut session, &batch_config(), &files)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Transport {
            stage: Stage::MailFrom,
            ..
        }
    ));
    let t = session.transport();
    assert_eq!(t.count("MAIL"), 1);
    assert_eq!(t.log.last().unwrap(), "CLOSE");
}

#[tokio::test]
async fn unusable_files_never_touch_the_server() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = write_files(&dir, &[b"Subject: tiny\n\nhi\n".to_vec()]);
    files.push(dir.path().join("missing.eml"));

    let mut session = Session::new(ScriptedTransport::new(Vec::new()));
    let report = run_batch(&mut session, &batch_config(), &files)
        .await
        .unwrap();

    assert_eq!(report.not_sent(), 2);
    assert!(
        report
            .outcomes
            .iter()
            .all(|(_, o)| matches!(o, Outcome::SkippedOpenOrValidationError { .. }))
    );
    assert!(session.transport().log.is_empty());
}

#[tokio::test]
async fn missing_from_header_skips_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(&dir, &[message("To: someone@test\n")]);
    let mut config = batch_config();
    config.sender = SenderSource::FromHeader;

    let mut session = Session::new(ScriptedTransport::new(Vec::new()));
    let report = run_batch(&mut session, &config, &files).await.unwrap();

    assert!(matches!(
        report.outcomes[0].1,
        Outcome::SkippedOpenOrValidationError { .. }
    ));
    assert!(session.transport().log.is_empty());
}

#[tokio::test]
async fn envelope_taken_from_headers() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(
        &dir,
        &[message(
            "From: \"Sender\" <sender@test>\nTo: a@test, B <b@test>\nCc: a@test\n",
        )],
    );
    let mut config = batch_config();
    config.sender = SenderSource::FromHeader;
    config.header_recipients = true;

    let mut session = Session::new(ScriptedTransport::new(vec![
        greeting(),
        ehlo(&[]),
        ok(),
        ok(),
        ok(),
        ok(),
        ok(),
        reply(221, "bye"),
    ]));

    let report = run_batch(&mut session, &config, &files).await.unwrap();

    assert_eq!(report.sent(), 1);
    let t = session.transport();
    assert_eq!(
        &t.log[2..6],
        &["MAIL sender@test", "RCPT a@test", "RCPT b@test", "RCPT to@test"]
    );
}

#[tokio::test]
async fn quoted_local_parts_from_headers_reach_the_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(
        &dir,
        &[message(
            "From: \"john doe\"@example.com\nTo: \"jane doe\"@example.com, x@example.com\n",
        )],
    );
    let mut config = batch_config();
    config.sender = SenderSource::FromHeader;
    config.header_recipients = true;
    config.extra_recipients.clear();

    let mut session = Session::new(ScriptedTransport::new(vec![
        greeting(),
        ehlo(&[]),
        ok(),
        ok(),
        ok(),
        ok(),
        reply(221, "bye"),
    ]));

    let report = run_batch(&mut session, &config, &files).await.unwrap();

    assert_eq!(report.sent(), 1);
    let t = session.transport();
    assert_eq!(
        &t.log[2..5],
        &[
            r#"MAIL "john doe"@example.com"#,
            r#"RCPT "jane doe"@example.com"#,
            "RCPT x@example.com",
        ]
    );
}

#[tokio::test]
async fn disconnect_policy_reconnects_per_message() {
    let dir = tempfile::tempdir().unwrap();
    let files = write_files(&dir, &[message(""), message("")]);
    let mut config = batch_config();
    config.disconnect_policy = DisconnectPolicy::AfterEachMessage;

    let mut session = Session::new(ScriptedTransport::new(vec![
        greeting(),
        ehlo(&[]),
        // sender refused, still disconnects
        reply(550, "not you"),
        fail(),
        greeting(),
        ehlo(&[]),
        ok(),
        ok(),
        ok(),
        reply(221, "bye"),
    ]));

    let report = run_batch(&mut session, &config, &files).await.unwrap();

    assert!(matches!(
        report.outcomes[0].1,
        Outcome::SkippedRejectedAtEnvelope { .. }
    ));
    assert_eq!(report.outcomes[1].1, Outcome::Sent);
    let t = session.transport();
    assert_eq!(t.count("OPEN"), 2);
    assert_eq!(t.count("QUIT"), 2);
    assert_eq!(t.count("CLOSE"), 2);
    assert!(t.is_exhausted());
}
