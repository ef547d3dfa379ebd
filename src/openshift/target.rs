//! The four deployment targets and their static OpenShift coordinates.

use std::fmt;

/// Namespace that authenticates with the stage token.
pub const STAGE_NAMESPACE: &str = "sync2jira-stage";

/// Registry repository that every target pulls from.
pub const SOURCE_IMAGE_REPOSITORY: &str = "quay.io/redhat-aqe/sync2jira";

/// A deployment destination this service knows how to retag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSelector {
    Master,
    Stage,
    OpenshiftBuild,
    SyncPage,
}

/// Static coordinates of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    /// Namespace segment of the request URL.
    pub url_namespace: &'static str,
    /// Image-stream-tag segment of the request URL.
    pub url_tag: &'static str,
    /// `metadata.namespace` in the request body; also picks the token.
    pub namespace: &'static str,
    /// `metadata.name` in the request body.
    pub name: &'static str,
    /// Tag of the source image in [`SOURCE_IMAGE_REPOSITORY`].
    pub source_tag: &'static str,
}

impl TargetSelector {
    pub const ALL: [TargetSelector; 4] = [
        TargetSelector::Master,
        TargetSelector::Stage,
        TargetSelector::OpenshiftBuild,
        TargetSelector::SyncPage,
    ];

    /// Map a message tag label to a target. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "master" => Some(Self::Master),
            "stage" => Some(Self::Stage),
            "openshift-build" => Some(Self::OpenshiftBuild),
            "sync-page" => Some(Self::SyncPage),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Stage => "stage",
            Self::OpenshiftBuild => "openshift-build",
            Self::SyncPage => "sync-page",
        }
    }

    pub fn spec(self) -> TargetSpec {
        match self {
            Self::Master => TargetSpec {
                url_namespace: "sync2jira",
                url_tag: "sync2jira:latest",
                namespace: "sync2jira",
                name: "sync2jira:latest",
                source_tag: "latest",
            },
            Self::SyncPage => TargetSpec {
                url_namespace: "sync2jira",
                url_tag: "sync2jira:sync-page",
                namespace: "sync2jira",
                name: "sync2jira-sync-page:latest",
                source_tag: "sync-page",
            },
            Self::Stage => TargetSpec {
                url_namespace: STAGE_NAMESPACE,
                url_tag: "sync2jira-stage:latest",
                namespace: STAGE_NAMESPACE,
                name: "sync2jira-stage:latest",
                source_tag: "stage",
            },
            // Deployed with this namespace string; it falls back to the default token.
            Self::OpenshiftBuild => TargetSpec {
                url_namespace: STAGE_NAMESPACE,
                url_tag: "openshift-build:latest",
                namespace: "sync2ijra-stage",
                name: "openshift-build:latest",
                source_tag: "openshift-build",
            },
        }
    }
}

impl TargetSpec {
    /// Full image-stream-tag endpoint under `api_base`.
    pub fn url(&self, api_base: &str) -> String {
        format!(
            "{api_base}/apis/image.openshift.io/v1/namespaces/{}/imagestreamtags/{}",
            self.url_namespace, self.url_tag
        )
    }

    /// Source image reference, e.g. `quay.io/redhat-aqe/sync2jira:latest`.
    pub fn source_image(&self) -> String {
        format!("{SOURCE_IMAGE_REPOSITORY}:{}", self.source_tag)
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
