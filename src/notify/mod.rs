//! Admin notifications: report model, templates, and SMTP delivery.

pub mod mailer;
pub mod notifier;
pub mod report;
pub mod templates;

pub use mailer::{Mailer, SmtpMailer};
pub use notifier::{Notifier, Notify};
pub use report::{Report, ReportKind};
pub use templates::Templates;
