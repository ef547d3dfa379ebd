//! Email body templates.
//!
//! Built-in HTML templates ship with the binary; a directory holding
//! `success_template.html` / `failure_template.html` can override either one.
//! Placeholders are `{{ name }}` and are substituted verbatim.

use std::path::Path;

use crate::error::NotifyError;
use crate::notify::report::{Report, ReportKind};

pub const SUCCESS_TEMPLATE: &str = "success_template.html";
pub const FAILURE_TEMPLATE: &str = "failure_template.html";

const BUILTIN_SUCCESS: &str = include_str!("../../templates/success_template.html");
const BUILTIN_FAILURE: &str = include_str!("../../templates/failure_template.html");

/// Rendered value for an absent namespace or data field.
const MISSING: &str = "None";

#[derive(Debug, Clone)]
pub struct Templates {
    success: String,
    failure: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            success: BUILTIN_SUCCESS.to_string(),
            failure: BUILTIN_FAILURE.to_string(),
        }
    }
}

impl Templates {
    /// Load templates, preferring files under `dir` when present.
    pub fn load(dir: Option<&Path>) -> Result<Self, NotifyError> {
        let mut templates = Self::default();
        let Some(dir) = dir else {
            return Ok(templates);
        };

        if let Some(body) = read_override(dir, SUCCESS_TEMPLATE)? {
            templates.success = body;
        }
        if let Some(body) = read_override(dir, FAILURE_TEMPLATE)? {
            templates.failure = body;
        }
        tracing::info!("Loaded notification templates from {}", dir.display());
        Ok(templates)
    }

    /// Render the body for `report`. Success bodies only see the namespace.
    pub fn render(&self, report: &Report) -> String {
        let namespace = report.namespace.as_deref().unwrap_or(MISSING);
        match report.kind {
            ReportKind::Success => substitute(&self.success, |name| match name {
                "namespace" => Some(namespace),
                _ => None,
            }),
            ReportKind::Failure => {
                let response = report.data.as_deref().unwrap_or(MISSING);
                substitute(&self.failure, |name| match name {
                    "namespace" => Some(namespace),
                    "response" => Some(response),
                    _ => None,
                })
            }
        }
    }
}

fn read_override(dir: &Path, name: &str) -> Result<Option<String>, NotifyError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| NotifyError::Template {
            name: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Replace each `{{ name }}` with `lookup(name)`. Unknown names render empty.
fn substitute<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                if let Some(value) = lookup(after[..end].trim()) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated placeholder, emit as-is.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_embeds_namespace_and_response() {
        let templates = Templates::default();
        let report = Report::failure(
            Some("sync2jira-stage".into()),
            "error sending request: connection refused <tcp>",
        );
        let html = templates.render(&report);
        assert!(html.contains("sync2jira-stage"));
        assert!(html.contains("error sending request: connection refused <tcp>"));
    }

    #[test]
    fn success_embeds_namespace_only() {
        let templates = Templates::default();
        let html = templates.render(&Report::success("openshift-build"));
        assert!(html.contains("openshift-build"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn missing_fields_render_none() {
        let templates = Templates::default();
        let html = templates.render(&Report {
            kind: ReportKind::Failure,
            namespace: None,
            data: None,
        });
        assert!(html.contains("<b>None</b>"));
        assert!(html.contains("<pre>None</pre>"));
    }

    #[test]
    fn substitute_handles_spacing_and_unknowns() {
        let out = substitute("a={{a}} b={{  b }} c={{ c }} d={{ d", |name| match name {
            "a" => Some("1"),
            "b" => Some("2"),
            _ => None,
        });
        assert_eq!(out, "a=1 b=2 c= d={{ d");
    }

    #[test]
    fn directory_overrides_one_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(FAILURE_TEMPLATE),
            "FAILED {{ namespace }}: {{ response }}",
        )
        .unwrap();

        let templates = Templates::load(Some(dir.path())).unwrap();
        let failure = templates.render(&Report::failure(Some("ns".into()), "503"));
        assert_eq!(failure, "FAILED ns: 503");

        let success = templates.render(&Report::success("ns"));
        assert!(success.contains("image update succeeded"));
    }

    #[test]
    fn no_directory_uses_builtins() {
        let templates = Templates::load(None).unwrap();
        assert_eq!(templates.success, BUILTIN_SUCCESS);
        assert_eq!(templates.failure, BUILTIN_FAILURE);
    }
}
