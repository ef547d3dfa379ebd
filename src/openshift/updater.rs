//! Image-stream-tag updates against the OpenShift API.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::OpenShiftConfig;
use crate::error::UpdateError;
use crate::notify::{Notify, Report};
use crate::openshift::header::build_header;
use crate::openshift::payload::ImageStreamTag;
use crate::openshift::target::TargetSelector;

/// Status and body of an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

/// Result of a single update attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// HTTP 200.
    Updated(UpstreamResponse),
    /// Any other HTTP status.
    Rejected(UpstreamResponse),
    /// The request never produced a response. Already reported by the updater.
    TransportFailed(String),
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// Retags one deployment target.
#[async_trait]
pub trait TagUpdate: Send + Sync {
    async fn update_tag(&self, target: TargetSelector) -> UpdateOutcome;
}

/// OpenShift-backed [`TagUpdate`]. One attempt, no retries.
pub struct TagUpdater {
    client: reqwest::Client,
    config: OpenShiftConfig,
    notifier: Arc<dyn Notify>,
}

impl TagUpdater {
    pub fn new(config: OpenShiftConfig, notifier: Arc<dyn Notify>) -> Self {
        Self::with_client(reqwest::Client::new(), config, notifier)
    }

    pub fn with_client(
        client: reqwest::Client,
        config: OpenShiftConfig,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        Self {
            client,
            config,
            notifier,
        }
    }

    async fn put(&self, target: TargetSelector) -> Result<UpstreamResponse, UpdateError> {
        let spec = target.spec();
        let url = spec.url(&self.config.api_base);
        let body = ImageStreamTag::for_target(&spec);

        let headers = build_header(&self.config, spec.namespace).map_err(|e| {
            UpdateError::Transport {
                url: url.clone(),
                reason: format!("invalid authorization header: {e}"),
            }
        })?;

        let resp = self
            .client
            .put(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpdateError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(status, "Failed to read response body from {url}: {e}");
                String::new()
            }
        };
        Ok(UpstreamResponse { status, body })
    }
}

#[async_trait]
impl TagUpdate for TagUpdater {
    async fn update_tag(&self, target: TargetSelector) -> UpdateOutcome {
        let spec = target.spec();

        match self.put(target).await {
            Ok(resp) if resp.status == 200 => {
                tracing::info!(selector = %target, "Tagged new image for {}", spec.name);
                UpdateOutcome::Updated(resp)
            }
            Ok(resp) => {
                let err = UpdateError::Rejected {
                    status: resp.status,
                    body: resp.body.clone(),
                };
                tracing::error!(selector = %target, "Failure updating image stream tag: {err}");
                UpdateOutcome::Rejected(resp)
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(selector = %target, "Failure updating image stream tag: {reason}");
                self.notifier
                    .notify(Report::failure(Some(spec.namespace.to_string()), reason.clone()))
                    .await;
                UpdateOutcome::TransportFailed(reason)
            }
        }
    }
}
