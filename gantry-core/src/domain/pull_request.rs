//! Pull request domain types

use serde::{Deserialize, Serialize};

/// A pull request reduced to its link and branches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Web URL of the pull request
    pub url: String,

    /// Head branch name (without `refs/heads/`)
    pub source: String,

    /// Base branch name (without `refs/heads/`)
    pub target: String,
}

/// State filter for pull request queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    #[default]
    Open,
    Closed,
    All,
}

impl PrState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrState::Open => "open",
            PrState::Closed => "closed",
            PrState::All => "all",
        }
    }

    /// Whether a pull request reported as `state` belongs to this filter
    pub fn includes(&self, state: &str) -> bool {
        match self {
            PrState::All => true,
            _ => self.as_str() == state,
        }
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to open a pull request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePullRequest {
    /// Branch containing the changes
    pub source: String,

    /// Branch the changes should be merged into
    pub target: String,

    pub title: String,

    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_filter() {
        assert!(PrState::Open.includes("open"));
        assert!(!PrState::Open.includes("closed"));
        assert!(PrState::Closed.includes("closed"));
        assert!(PrState::All.includes("closed"));
        assert!(PrState::All.includes(""));
    }
}
