//! Check domain types
//!
//! A check is a CI status report attached to a commit and shown in the
//! platform UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a check request does not set one
pub const DEFAULT_CHECK_TITLE: &str = "CI Report";

/// Lifecycle status of a check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    #[default]
    Completed,
}

/// Final outcome of a completed check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    #[default]
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
}

/// Request to publish a check
///
/// Unset fields fall back to the driver's defaults: the current commit,
/// [`DEFAULT_CHECK_TITLE`], "now" for both timestamps, a successful
/// conclusion and a completed status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Markdown summary shown in the check output
    pub report: String,
    pub head_sha: Option<String>,
    pub title: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub conclusion: Option<CheckConclusion>,
    pub status: Option<CheckStatus>,
}

impl CheckRequest {
    pub fn new(report: impl Into<String>) -> Self {
        Self {
            report: report.into(),
            ..Default::default()
        }
    }

    pub fn head_sha(mut self, sha: impl Into<String>) -> Self {
        self.head_sha = Some(sha.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn conclusion(mut self, conclusion: CheckConclusion) -> Self {
        self.conclusion = Some(conclusion);
        self
    }

    pub fn status(mut self, status: CheckStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(CheckStatus::InProgress).unwrap(),
            serde_json::json!("in_progress")
        );
        assert_eq!(
            serde_json::to_value(CheckConclusion::ActionRequired).unwrap(),
            serde_json::json!("action_required")
        );
    }

    #[test]
    fn test_builder_leaves_defaults_unset() {
        let req = CheckRequest::new("## Report").title("Metrics");
        assert_eq!(req.report, "## Report");
        assert_eq!(req.title.as_deref(), Some("Metrics"));
        assert!(req.head_sha.is_none());
        assert!(req.conclusion.is_none());
    }
}
