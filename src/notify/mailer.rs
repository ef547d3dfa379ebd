//! Outbound email via SMTP (lettre).

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use crate::config::MailConfig;
use crate::error::NotifyError;

/// Sends a rendered HTML email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &Mailbox, subject: &str, html: String) -> Result<(), NotifyError>;
}

/// SMTP mailer. Uses an authenticated TLS relay when credentials are
/// configured, a plain local relay otherwise.
pub struct SmtpMailer {
    from: Mailbox,
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let transport = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(password)) => {
                let creds = Credentials::new(user.clone(), password.expose_secret().to_string());
                SmtpTransport::relay(&config.smtp_host)
                    .map_err(|e| NotifyError::Send(format!("SMTP relay error: {e}")))?
                    .port(config.smtp_port)
                    .credentials(creds)
                    .build()
            }
            _ => SmtpTransport::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build(),
        };

        Ok(Self {
            from: config.from.clone(),
            transport,
        })
    }
}

/// Assemble the message. Split out so it can be checked without a server.
pub fn build_message(
    from: &Mailbox,
    to: &Mailbox,
    subject: &str,
    html: String,
) -> Result<Message, NotifyError> {
    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html)
        .map_err(|e| NotifyError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &Mailbox, subject: &str, html: String) -> Result<(), NotifyError> {
        let email = build_message(&self.from, to, subject, html)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| NotifyError::Send(format!("mail task panicked: {e}")))?
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        tracing::info!("Email sent to {}", to.email);
        Ok(())
    }
}
