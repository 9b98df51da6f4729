// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Email notification adapter over SMTP.

use super::{NotifyAdapter, NotifyError, Severity};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Mail relay settings, mapped from the `[notifications]` config
/// section by the binary.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender: String,
    /// Default recipient for anything without a more specific route
    pub recipient: String,
    /// Overrides by severity/topic; fall back to `recipient`
    pub recipient_error: Option<String>,
    pub recipient_summary: Option<String>,
    pub recipient_hazard: Option<String>,
}

impl SmtpSettings {
    fn recipient_for(&self, severity: Severity, topic: &str) -> &str {
        let routed = match topic {
            "summary" => self.recipient_summary.as_deref(),
            "hazard" => self.recipient_hazard.as_deref(),
            _ if severity == Severity::Error => self.recipient_error.as_deref(),
            _ => None,
        };
        routed.unwrap_or(&self.recipient)
    }
}

/// SMTP notifier. Construction validates the relay settings; sending
/// is best-effort from the caller's point of view.
#[derive(Clone)]
pub struct SmtpNotifyAdapter {
    settings: Arc<SmtpSettings>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifyAdapter {
    pub fn new(settings: SmtpSettings) -> Result<Self, NotifyError> {
        let mut builder = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
                .map_err(|e| NotifyError::SendFailed(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.server)
        };
        builder = builder.port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            settings: Arc::new(settings),
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl NotifyAdapter for SmtpNotifyAdapter {
    async fn notify(
        &self,
        severity: Severity,
        topic: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let from: Mailbox = self
            .settings
            .sender
            .parse()
            .map_err(|e| NotifyError::SendFailed(format!("bad sender address: {e}")))?;
        let to: Mailbox = self
            .settings
            .recipient_for(severity, topic)
            .parse()
            .map_err(|e| NotifyError::SendFailed(format!("bad recipient address: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(format!("[shuttle {severity}] {topic}"))
            .body(body.to_string())
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::SendFailed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "smtp_tests.rs"]
mod tests;
