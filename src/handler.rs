//! Reacts to container tag update notifications for the watched repository.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::bus::MessageHandler;
use crate::error::{Error, MessageError};
use crate::notify::{Notify, Report};
use crate::openshift::{TagUpdate, TargetSelector, UpdateOutcome};

/// Fields we read from a tag-updated message. Other fields are kept in the
/// raw value for failure reports.
#[derive(Debug, Clone, Deserialize)]
pub struct TagUpdated {
    pub repo: String,
    pub tag: String,
}

#[derive(Deserialize)]
struct RepoOnly {
    repo: String,
}

/// Maps tag updates on the watched repository to image-stream-tag updates.
pub struct UpdateListener {
    watched_repo: String,
    updater: Arc<dyn TagUpdate>,
    notifier: Arc<dyn Notify>,
}

impl UpdateListener {
    pub fn new(
        watched_repo: impl Into<String>,
        updater: Arc<dyn TagUpdate>,
        notifier: Arc<dyn Notify>,
    ) -> Self {
        Self {
            watched_repo: watched_repo.into(),
            updater,
            notifier,
        }
    }
}

/// Parse a message body and read its source repository. Only `repo` is
/// required at this point; messages from other repositories may have any shape.
pub fn parse_message(body: &[u8]) -> Result<(serde_json::Value, String), MessageError> {
    let raw: serde_json::Value = serde_json::from_slice(body)?;
    let RepoOnly { repo } = RepoOnly::deserialize(&raw)?;
    Ok((raw, repo))
}

#[async_trait]
impl MessageHandler for UpdateListener {
    async fn handle(&self, body: &[u8]) -> Result<(), Error> {
        let (raw, repo) = parse_message(body)?;
        tracing::info!("Encountered message: {raw}");

        if repo != self.watched_repo {
            tracing::debug!(repo = %repo, "Ignoring message for unwatched repository");
            return Ok(());
        }

        let msg = TagUpdated::deserialize(&raw).map_err(MessageError::from)?;

        let Some(target) = TargetSelector::from_label(&msg.tag) else {
            tracing::debug!(tag = %msg.tag, "Ignoring unrecognized tag");
            return Ok(());
        };

        match self.updater.update_tag(target).await {
            UpdateOutcome::Updated(_) => {
                self.notifier.notify(Report::success(msg.tag)).await;
            }
            UpdateOutcome::Rejected(_) => {
                self.notifier
                    .notify(Report::failure(None, raw.to_string()))
                    .await;
            }
            // The updater has already reported this one.
            UpdateOutcome::TransportFailed(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::notify::ReportKind;
    use crate::openshift::UpstreamResponse;

    const REPO: &str = "quay.io/redhat-aqe/sync2jira";

    struct StubUpdater {
        outcome: UpdateOutcome,
        calls: Mutex<Vec<TargetSelector>>,
    }

    impl StubUpdater {
        fn returning(outcome: UpdateOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn status(status: u16) -> Arc<Self> {
            let resp = UpstreamResponse {
                status,
                body: String::new(),
            };
            Self::returning(if status == 200 {
                UpdateOutcome::Updated(resp)
            } else {
                UpdateOutcome::Rejected(resp)
            })
        }
    }

    #[async_trait]
    impl TagUpdate for StubUpdater {
        async fn update_tag(&self, target: TargetSelector) -> UpdateOutcome {
            self.calls.lock().unwrap().push(target);
            self.outcome.clone()
        }
    }

    #[derive(Default)]
    struct RecordingNotify {
        reports: Mutex<Vec<Report>>,
    }

    #[async_trait]
    impl Notify for RecordingNotify {
        async fn notify(&self, report: Report) {
            self.reports.lock().unwrap().push(report);
        }
    }

    fn listener(updater: Arc<StubUpdater>) -> (UpdateListener, Arc<RecordingNotify>) {
        let notify = Arc::new(RecordingNotify::default());
        (UpdateListener::new(REPO, updater, notify.clone()), notify)
    }

    fn body(repo: &str, tag: &str) -> Vec<u8> {
        serde_json::json!({ "repo": repo, "tag": tag }).to_string().into_bytes()
    }

    #[tokio::test]
    async fn other_repositories_are_ignored() {
        let updater = StubUpdater::status(200);
        let (listener, notify) = listener(updater.clone());

        for tag in ["master", "stage", "openshift-build", "sync-page", "other"] {
            listener.handle(&body("quay.io/someone/else", tag)).await.unwrap();
        }

        assert!(updater.calls.lock().unwrap().is_empty());
        assert!(notify.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tags_are_ignored() {
        let updater = StubUpdater::status(200);
        let (listener, notify) = listener(updater.clone());

        listener.handle(&body(REPO, "unknown-label")).await.unwrap();

        assert!(updater.calls.lock().unwrap().is_empty());
        assert!(notify.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn master_success_reports_tag() {
        let updater = StubUpdater::status(200);
        let (listener, notify) = listener(updater.clone());

        listener.handle(&body(REPO, "master")).await.unwrap();

        assert_eq!(*updater.calls.lock().unwrap(), vec![TargetSelector::Master]);
        let reports = notify.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0], Report::success("master"));
    }

    #[tokio::test]
    async fn master_rejection_reports_original_message() {
        let updater = StubUpdater::status(503);
        let (listener, notify) = listener(updater.clone());

        let raw = serde_json::json!({ "repo": REPO, "tag": "master", "digest": "sha256:abc" });
        listener.handle(raw.to_string().as_bytes()).await.unwrap();

        assert_eq!(*updater.calls.lock().unwrap(), vec![TargetSelector::Master]);
        let reports = notify.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, ReportKind::Failure);
        assert_eq!(reports[0].namespace, None);
        let data: serde_json::Value =
            serde_json::from_str(reports[0].data.as_deref().unwrap()).unwrap();
        assert_eq!(data, raw);
    }

    #[tokio::test]
    async fn each_label_selects_its_target() {
        for target in TargetSelector::ALL {
            let updater = StubUpdater::status(200);
            let (listener, _) = listener(updater.clone());
            listener.handle(&body(REPO, target.label())).await.unwrap();
            assert_eq!(*updater.calls.lock().unwrap(), vec![target]);
        }
    }

    #[tokio::test]
    async fn transport_failure_is_not_reported_twice() {
        let updater =
            StubUpdater::returning(UpdateOutcome::TransportFailed("connection refused".into()));
        let (listener, notify) = listener(updater.clone());

        listener.handle(&body(REPO, "stage")).await.unwrap();

        assert_eq!(*updater.calls.lock().unwrap(), vec![TargetSelector::Stage]);
        assert!(notify.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_repositories_need_no_tag() {
        let updater = StubUpdater::status(200);
        let (listener, notify) = listener(updater.clone());

        for raw in [
            r#"{"repo": "other"}"#,
            r#"{"repo": "other", "tag": null}"#,
            r#"{"repo": "other", "tag": 5}"#,
        ] {
            listener.handle(raw.as_bytes()).await.unwrap();
        }

        assert!(updater.calls.lock().unwrap().is_empty());
        assert!(notify.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_bodies_are_errors() {
        let updater = StubUpdater::status(200);
        let (listener, notify) = listener(updater.clone());

        let not_json = listener.handle(b"not json").await;
        assert!(matches!(not_json, Err(Error::Message(MessageError::Malformed(_)))));

        let missing_repo = listener.handle(br#"{"tag": "master"}"#).await;
        assert!(matches!(missing_repo, Err(Error::Message(MessageError::Malformed(_)))));

        let no_tag = format!(r#"{{"repo": "{REPO}"}}"#);
        let watched_without_tag = listener.handle(no_tag.as_bytes()).await;
        assert!(matches!(
            watched_without_tag,
            Err(Error::Message(MessageError::Malformed(_)))
        ));

        assert!(updater.calls.lock().unwrap().is_empty());
        assert!(notify.reports.lock().unwrap().is_empty());
    }
}
