//! Error types for the continuous-deployment service.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Message bus error: {0}")]
    Bus(#[from] BusError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Inbound message errors.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Malformed message body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Image-stream-tag update errors.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Upstream rejected update with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Notification delivery errors. These never leave the notifier.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to load template {name}: {reason}")]
    Template { name: String, reason: String },

    #[error("Invalid mail address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Send(String),
}

/// Message bus errors.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Failed to read TLS material {path}: {source}")]
    Tls {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid client identity: {0}")]
    Identity(String),

    #[error("Failed to connect to broker: {0}")]
    Connect(String),

    #[error("Consumer on {queue} failed: {reason}")]
    Consume { queue: String, reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
