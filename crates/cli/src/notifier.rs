// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notifier selection from the `[notifications]` section.

use async_trait::async_trait;
use shuttle_adapters::notify::SmtpSettings;
use shuttle_adapters::{NoopNotifyAdapter, NotifyAdapter, NotifyError, Severity, SmtpNotifyAdapter};
use shuttle_config::NotificationsConfig;
use tracing::warn;

/// Either a real SMTP notifier or a no-op, picked at startup.
#[derive(Clone)]
pub enum CliNotifier {
    Smtp(SmtpNotifyAdapter),
    Noop(NoopNotifyAdapter),
}

impl CliNotifier {
    /// Build from config. Notifications that are enabled but
    /// incompletely configured degrade to no-op with a warning rather
    /// than failing the run.
    pub fn from_config(config: &NotificationsConfig) -> Self {
        if !config.notify && !config.notify_summary {
            return CliNotifier::Noop(NoopNotifyAdapter::new());
        }

        let (Some(server), Some(sender), Some(recipient)) = (
            config.smtp_server.clone(),
            config.sender_email.clone(),
            config.recipient_email.clone(),
        ) else {
            warn!("notifications enabled but smtp_server/sender_email/recipient_email incomplete; notifications disabled");
            return CliNotifier::Noop(NoopNotifyAdapter::new());
        };

        let settings = SmtpSettings {
            server,
            port: config.smtp_port,
            use_tls: config.use_tls,
            username: config.username.clone(),
            password: config.password.clone(),
            sender,
            recipient,
            recipient_error: config.recipient_email_error.clone(),
            recipient_summary: config.recipient_email_summary.clone(),
            recipient_hazard: config.recipient_email_hazard.clone(),
        };

        match SmtpNotifyAdapter::new(settings) {
            Ok(adapter) => CliNotifier::Smtp(adapter),
            Err(e) => {
                warn!(error = %e, "cannot build SMTP notifier; notifications disabled");
                CliNotifier::Noop(NoopNotifyAdapter::new())
            }
        }
    }
}

#[async_trait]
impl NotifyAdapter for CliNotifier {
    async fn notify(
        &self,
        severity: Severity,
        topic: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        match self {
            CliNotifier::Smtp(adapter) => adapter.notify(severity, topic, body).await,
            CliNotifier::Noop(adapter) => adapter.notify(severity, topic, body).await,
        }
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
