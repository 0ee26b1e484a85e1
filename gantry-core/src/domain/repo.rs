//! Repository references
//!
//! A [`RepoRef`] is the resolved owner/repository pair used to address
//! platform endpoints. An organization-scoped reference has no repository.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Host used to resolve `owner/repo` slugs
pub const DEFAULT_HOST: &str = "https://github.com";

/// Errors produced while parsing a repository reference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRepoError {
    /// The input was empty or whitespace
    #[error("repository reference is empty")]
    Empty,

    /// The input looked like a URL but could not be parsed
    #[error("invalid repository URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    /// The URL has no owner segment in its path
    #[error("repository reference '{0}' has no owner")]
    MissingOwner(String),
}

/// Resolved repository or organization reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RepoRef {
    /// A single repository owned by a user or organization
    Repository { owner: String, repo: String },

    /// An organization as a whole (org-level runners)
    Organization { owner: String },
}

impl RepoRef {
    /// Parses a full URL (`https://host/owner/repo`) or an `owner/repo` slug.
    ///
    /// Slugs are resolved against [`DEFAULT_HOST`], so `owner/repo` and
    /// `https://github.com/owner/repo` yield the same reference. A trailing
    /// `.git` or `/` is ignored. A single path segment denotes an organization.
    pub fn parse(input: &str) -> Result<Self, ParseRepoError> {
        let url = to_url(input)?;
        let mut segments = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter();

        let owner = segments
            .next()
            .ok_or_else(|| ParseRepoError::MissingOwner(input.to_string()))?
            .to_string();

        match segments.next() {
            Some(repo) => Ok(RepoRef::Repository {
                owner,
                repo: repo.strip_suffix(".git").unwrap_or(repo).to_string(),
            }),
            None => Ok(RepoRef::Organization { owner }),
        }
    }

    /// Owner (user or organization) login
    pub fn owner(&self) -> &str {
        match self {
            RepoRef::Repository { owner, .. } | RepoRef::Organization { owner } => owner,
        }
    }

    /// Repository name, `None` for organization references
    pub fn repo(&self) -> Option<&str> {
        match self {
            RepoRef::Repository { repo, .. } => Some(repo),
            RepoRef::Organization { .. } => None,
        }
    }

    pub fn is_organization(&self) -> bool {
        matches!(self, RepoRef::Organization { .. })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoRef::Repository { owner, repo } => write!(f, "{}/{}", owner, repo),
            RepoRef::Organization { owner } => write!(f, "{}", owner),
        }
    }
}

impl std::str::FromStr for RepoRef {
    type Err = ParseRepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalizes a repository URL or slug into a URL.
///
/// The returned URL has no trailing slash. Slugs are joined onto
/// [`DEFAULT_HOST`].
pub fn to_url(input: &str) -> Result<Url, ParseRepoError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ParseRepoError::Empty);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("{}/{}", DEFAULT_HOST, trimmed.trim_start_matches('/'))
    };

    Url::parse(&candidate).map_err(|e| ParseRepoError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })
}
