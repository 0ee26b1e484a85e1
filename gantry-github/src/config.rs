//! Driver configuration
//!
//! [`ClientConfig`] holds everything a [`crate::GitHubClient`] needs: the
//! target repository, credentials, and the [`CiContext`] that supplies
//! defaults (current commit, branch, run id) for operations called without
//! them. The context is passed explicitly so nothing reads the environment
//! behind the caller's back.

use gantry_core::domain::branch_name;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Default committer name rendered by `update_git_config`
pub const DEFAULT_USER_NAME: &str = "gantry-bot";

/// Default committer email rendered by `update_git_config`
pub const DEFAULT_USER_EMAIL: &str = "gantry-bot@users.noreply.github.com";

/// Endpoint describing the latest runner release
pub const RUNNER_RELEASE_URL: &str = "https://api.github.com/repos/actions/runner/releases/latest";

/// Base URL runner archives are downloaded from
pub const RUNNER_DOWNLOAD_BASE: &str = "https://github.com/actions/runner/releases/download";

/// Facts about the CI job the driver is running in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiContext {
    /// Commit that triggered the workflow (`GITHUB_SHA`)
    pub sha: Option<String>,

    /// Head commit of the pull request, for pull request events
    pub pr_head_sha: Option<String>,

    /// Fully qualified ref (`GITHUB_REF`)
    pub git_ref: Option<String>,

    /// Source branch of a pull request (`GITHUB_HEAD_REF`)
    pub head_ref: Option<String>,

    /// Current workflow run (`GITHUB_RUN_ID`)
    pub run_id: Option<u64>,

    /// Triggering event (`GITHUB_EVENT_NAME`)
    pub event_name: Option<String>,

    /// Whether a CI system is driving this process (`CI`)
    pub in_ci: bool,

    /// Token the CI system injected into the job (`GITHUB_TOKEN`)
    pub ambient_token: Option<String>,
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    head: EventHead,
}

#[derive(Deserialize)]
struct EventHead {
    sha: String,
}

impl CiContext {
    /// Creates a context from the process environment
    ///
    /// Reads:
    /// - GITHUB_SHA, GITHUB_REF, GITHUB_HEAD_REF
    /// - GITHUB_RUN_ID (ignored if not numeric)
    /// - GITHUB_EVENT_NAME, GITHUB_EVENT_PATH (pull request head SHA)
    /// - CI, GITHUB_TOKEN
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a context from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let event_name = get("GITHUB_EVENT_NAME");
        let pr_head_sha = if event_name.as_deref().is_some_and(is_pull_request_event) {
            get("GITHUB_EVENT_PATH").and_then(|p| read_pr_head_sha(Path::new(&p)))
        } else {
            None
        };

        Self {
            sha: get("GITHUB_SHA"),
            pr_head_sha,
            git_ref: get("GITHUB_REF"),
            head_ref: get("GITHUB_HEAD_REF"),
            run_id: get("GITHUB_RUN_ID").and_then(|s| s.parse().ok()),
            event_name,
            in_ci: get("CI").is_some_and(|v| v != "false" && v != "0"),
            ambient_token: get("GITHUB_TOKEN"),
        }
    }

    /// Whether the workflow was triggered by a pull request
    pub fn is_pull_request(&self) -> bool {
        self.event_name.as_deref().is_some_and(is_pull_request_event)
    }

    /// Commit under test: the PR head for pull request events, else `GITHUB_SHA`
    pub fn sha(&self) -> Option<&str> {
        if self.is_pull_request() {
            if let Some(sha) = self.pr_head_sha.as_deref() {
                return Some(sha);
            }
        }
        self.sha.as_deref()
    }

    /// Branch under test, preferring the pull request source branch
    pub fn branch(&self) -> Option<&str> {
        self.head_ref
            .as_deref()
            .or(self.git_ref.as_deref())
            .map(branch_name)
    }
}

fn is_pull_request_event(name: &str) -> bool {
    matches!(name, "pull_request" | "pull_request_target")
}

fn read_pr_head_sha(path: &Path) -> Option<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Could not read event payload {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<EventPayload>(&raw) {
        Ok(payload) => payload.pull_request.map(|pr| pr.head.sha),
        Err(e) => {
            debug!("Could not parse event payload {}: {}", path.display(), e);
            None
        }
    }
}

/// GitHub driver configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Repository URL or `owner/repo` slug; a single segment targets an organization
    pub repo: String,

    /// Bearer token for the REST API
    pub token: String,

    /// Overrides the REST API base (derived from the repository host otherwise)
    pub api_base_url: Option<String>,

    /// CI job facts used as operation defaults
    pub context: CiContext,

    /// Committer name rendered into git configuration commands
    pub user_name: String,

    /// Committer email rendered into git configuration commands
    pub user_email: String,

    /// Release API endpoint used to resolve the latest runner version
    pub runner_release_url: String,

    /// Base URL runner archives are downloaded from
    pub runner_download_base: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("repo", &self.repo)
            .field("token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("sha", &self.context.sha())
            .field("run_id", &self.context.run_id)
            .field("user_name", &self.user_name)
            .field("user_email", &self.user_email)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new configuration with defaults and an empty CI context
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            token: token.into(),
            api_base_url: None,
            context: CiContext::default(),
            user_name: DEFAULT_USER_NAME.to_string(),
            user_email: DEFAULT_USER_EMAIL.to_string(),
            runner_release_url: RUNNER_RELEASE_URL.to_string(),
            runner_download_base: RUNNER_DOWNLOAD_BASE.to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - REPO, or GITHUB_REPOSITORY (joined onto GITHUB_SERVER_URL when set)
    /// - REPO_TOKEN or GITHUB_TOKEN
    ///
    /// The CI context is read with [`CiContext::from_env`].
    pub fn from_env() -> Result<Self> {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let repo = var("REPO")
            .or_else(|| {
                var("GITHUB_REPOSITORY").map(|slug| match var("GITHUB_SERVER_URL") {
                    Some(server) => format!("{}/{}", server.trim_end_matches('/'), slug),
                    None => slug,
                })
            })
            .ok_or_else(|| ClientError::Config("repo not found".to_string()))?;

        let token = var("REPO_TOKEN")
            .or_else(|| var("GITHUB_TOKEN"))
            .ok_or_else(|| ClientError::Config("token not found".to_string()))?;

        Ok(Self::new(repo, token).with_context(CiContext::from_env()))
    }

    pub fn with_context(mut self, context: CiContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.user_name = name.into();
        self.user_email = email.into();
        self
    }

    pub fn with_runner_release(
        mut self,
        release_url: impl Into<String>,
        download_base: impl Into<String>,
    ) -> Self {
        self.runner_release_url = release_url.into();
        self.runner_download_base = download_base.into();
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.repo.trim().is_empty() {
            return Err(ClientError::Config("repo not found".to_string()));
        }

        if self.token.trim().is_empty() {
            return Err(ClientError::Config("token not found".to_string()));
        }

        if let Some(base) = &self.api_base_url {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ClientError::Config(
                    "api_base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }
}
