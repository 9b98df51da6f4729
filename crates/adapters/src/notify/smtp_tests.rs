// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn settings() -> SmtpSettings {
    SmtpSettings {
        server: "mail.example.net".to_string(),
        port: 587,
        use_tls: false,
        username: None,
        password: None,
        sender: "shuttle@example.net".to_string(),
        recipient: "ops@example.net".to_string(),
        recipient_error: Some("oncall@example.net".to_string()),
        recipient_summary: Some("reports@example.net".to_string()),
        recipient_hazard: Some("security@example.net".to_string()),
    }
}

#[parameterized(
    summary_topic = { Severity::Info, "summary", "reports@example.net" },
    hazard_topic = { Severity::Warning, "hazard", "security@example.net" },
    error_severity = { Severity::Error, "run-failed", "oncall@example.net" },
    default_route = { Severity::Info, "throttle", "ops@example.net" },
)]
fn recipient_routing(severity: Severity, topic: &str, expected: &str) {
    assert_eq!(settings().recipient_for(severity, topic), expected);
}

#[test]
fn missing_overrides_fall_back_to_default() {
    let mut s = settings();
    s.recipient_error = None;
    s.recipient_summary = None;
    s.recipient_hazard = None;
    assert_eq!(s.recipient_for(Severity::Error, "x"), "ops@example.net");
    assert_eq!(s.recipient_for(Severity::Info, "summary"), "ops@example.net");
}

#[tokio::test]
async fn adapter_builds_from_plain_relay_settings() {
    SmtpNotifyAdapter::new(settings()).unwrap();
}

#[tokio::test]
async fn unreachable_relay_surfaces_send_failure() {
    let mut s = settings();
    // Reserved TEST-NET address; connection will fail fast or resolve nowhere
    s.server = "127.0.0.1".to_string();
    s.port = 1; // nothing listens here
    let adapter = SmtpNotifyAdapter::new(s).unwrap();

    let err = adapter
        .notify(Severity::Info, "test", "body")
        .await
        .unwrap_err();
    assert!(matches!(err, NotifyError::SendFailed(_)), "{err}");
}
