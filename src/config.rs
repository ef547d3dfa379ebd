//! Configuration types.
//!
//! Everything is read once at startup and passed by reference into each
//! component. Nothing below this module touches the process environment.

use std::path::PathBuf;

use lettre::message::Mailbox;
use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_SMTP_HOST: &str = "localhost";
const DEFAULT_SMTP_PORT: u16 = 25;
const DEFAULT_MAIL_FROM: &str = "continuous-deployment@localhost";

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub openshift: OpenShiftConfig,
    pub bus: BusConfig,
    pub mail: MailConfig,
    /// Source repository whose tag updates we react to.
    pub watched_repo: String,
}

/// OpenShift API access.
#[derive(Debug, Clone)]
pub struct OpenShiftConfig {
    /// Scheme + host, e.g. `https://api.example.com:6443`.
    pub api_base: String,
    pub token: SecretString,
    pub stage_token: SecretString,
}

/// Message bus connection settings.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub urls: Vec<String>,
    pub query: String,
    pub cert: PathBuf,
    pub key: PathBuf,
    pub ca_certs: PathBuf,
}

/// Notification settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub send_emails: bool,
    /// Present whenever `send_emails` is set.
    pub mailing_list: Option<Mailbox>,
    pub from: Mailbox,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub template_dir: Option<PathBuf>,
}

impl Config {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openshift = OpenShiftConfig {
            api_base: api_base(&required("ENDPOINT")?),
            token: SecretString::from(required("TOKEN")?),
            stage_token: SecretString::from(required("STAGE_TOKEN")?),
        };

        let bus = BusConfig {
            urls: vec![required("ACTIVEMQ_URL_1")?, required("ACTIVEMQ_URL_2")?],
            query: required("ACTIVEMQ_QUERY")?,
            cert: PathBuf::from(required("CERT")?),
            key: PathBuf::from(required("KEY")?),
            ca_certs: PathBuf::from(required("CA_CERTS")?),
        };

        let send_emails = parse_flag(&required("SEND_EMAILS")?);

        let mailing_list = if send_emails {
            Some(parse_mailbox("MAILING_LIST", &required("MAILING_LIST")?)?)
        } else {
            optional("MAILING_LIST")
                .map(|v| parse_mailbox("MAILING_LIST", &v))
                .transpose()?
        };

        let smtp_port = match optional("SMTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "SMTP_PORT".into(),
                    message: e.to_string(),
                })?,
            None => DEFAULT_SMTP_PORT,
        };

        let from = parse_mailbox(
            "MAIL_FROM",
            &optional("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
        )?;

        let mail = MailConfig {
            send_emails,
            mailing_list,
            from,
            smtp_host: optional("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD").map(SecretString::from),
            template_dir: optional("TEMPLATE_DIR").map(PathBuf::from),
        };

        Ok(Self {
            openshift,
            bus,
            mail,
            watched_repo: required("ACTIVEMQ_REPO_NAME")?,
        })
    }
}

/// Interpret a boolean-like flag. Only explicit "off" spellings disable.
pub fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Turn the `ENDPOINT` host into a base URL. Values with a scheme pass through.
fn api_base(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}

fn parse_mailbox(key: &str, raw: &str) -> Result<Mailbox, ConfigError> {
    raw.trim()
        .parse::<Mailbox>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}
