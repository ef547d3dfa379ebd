//! Admin notifications for tag updates.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailbox;

use crate::config::MailConfig;
use crate::error::NotifyError;
use crate::notify::mailer::{Mailer, SmtpMailer};
use crate::notify::report::Report;
use crate::notify::templates::Templates;

/// Something that can deliver a [`Report`]. Delivery is best effort.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, report: Report);
}

/// Renders reports and mails them to the admin list.
pub struct Notifier {
    enabled: bool,
    mailing_list: Option<Mailbox>,
    templates: Templates,
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(
        config: &MailConfig,
        templates: Templates,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            enabled: config.send_emails,
            mailing_list: config.mailing_list.clone(),
            templates,
            mailer,
        }
    }

    /// Build a notifier backed by SMTP and the configured templates.
    pub fn from_config(config: &MailConfig) -> Result<Self, NotifyError> {
        let templates = Templates::load(config.template_dir.as_deref())?;
        let mailer = Arc::new(SmtpMailer::new(config)?);
        Ok(Self::new(config, templates, mailer))
    }

    async fn deliver(&self, report: &Report) -> Result<(), NotifyError> {
        let Some(to) = &self.mailing_list else {
            return Err(NotifyError::Address {
                address: String::new(),
                reason: "no mailing list configured".into(),
            });
        };
        let html = self.templates.render(report);
        self.mailer.send(to, &report.subject(), html).await
    }
}

#[async_trait]
impl Notify for Notifier {
    async fn notify(&self, report: Report) {
        if !self.enabled {
            tracing::info!(
                kind = %report.kind,
                namespace = report.namespace.as_deref().unwrap_or("None"),
                data = report.data.as_deref().unwrap_or("None"),
                "SEND_EMAILS disabled, not sending email"
            );
            return;
        }

        if let Err(e) = self.deliver(&report).await {
            tracing::error!(kind = %report.kind, "Failed to send notification: {e}");
        }
    }
}
