//! Notification reports.

use std::fmt;

/// Outcome class carried in the subject line and used to pick the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Success,
    Failure,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification: what happened, where, and any supporting detail.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: ReportKind,
    pub namespace: Option<String>,
    pub data: Option<String>,
}

impl Report {
    pub fn success(namespace: impl Into<String>) -> Self {
        Self {
            kind: ReportKind::Success,
            namespace: Some(namespace.into()),
            data: None,
        }
    }

    pub fn failure(namespace: Option<String>, data: impl Into<String>) -> Self {
        Self {
            kind: ReportKind::Failure,
            namespace,
            data: Some(data.into()),
        }
    }

    /// Subject line for the outgoing email.
    pub fn subject(&self) -> String {
        format!("Sync2Jira Build Image Update Status: {}!", self.kind)
    }
}
