//! Driver abstraction
//!
//! [`CiDriver`] is the uniform interface an orchestration tool programs
//! against. Each source-control platform provides one implementation.
//! Operations a platform cannot perform still exist on the trait and fail
//! with the driver's "unsupported" error; [`Capabilities`] lets callers check
//! up front instead of discovering that at runtime.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::process::Child;

use crate::domain::check::CheckRequest;
use crate::domain::comment::Comment;
use crate::domain::job::Job;
use crate::domain::pull_request::{CreatePullRequest, PrState, PullRequest};
use crate::domain::runner::{Runner, RunnerLaunch};

/// Optional features a driver may or may not offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Publishing report artifacts to platform storage
    pub artifact_upload: bool,

    /// Registering a runner directly through the API (without a runner binary)
    pub runner_registration: bool,

    /// Managing runners at organization scope
    pub organization_runners: bool,
}

/// CI operations against one source-control platform
#[async_trait]
pub trait CiDriver: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Which optional operations this driver supports
    fn capabilities(&self) -> Capabilities;

    /// Comments on a commit, returning the comment's web URL
    async fn comment_create(&self, report: &str, commit_sha: &str) -> Result<String, Self::Error>;

    /// Replaces the body of a commit comment, returning its web URL
    async fn comment_update(&self, report: &str, comment_id: u64) -> Result<String, Self::Error>;

    /// All comments on a commit
    async fn commit_comments(&self, commit_sha: &str) -> Result<Vec<Comment>, Self::Error>;

    /// Pull requests associated with a commit
    async fn commit_prs(&self, commit_sha: &str, state: PrState) -> Result<Vec<PullRequest>, Self::Error>;

    /// Publishes a check, returning the platform's raw payload
    async fn check_create(&self, request: CheckRequest) -> Result<serde_json::Value, Self::Error>;

    /// Publishes a report artifact
    async fn upload(&self, path: &Path) -> Result<(), Self::Error>;

    /// Fetches a runner registration token
    async fn runner_token(&self) -> Result<String, Self::Error>;

    /// Registers a runner through the API
    async fn register_runner(&self, name: &str, labels: &[String]) -> Result<(), Self::Error>;

    /// Removes a registered runner
    async fn unregister_runner(&self, runner_id: u64) -> Result<(), Self::Error>;

    /// Configures and launches a runner process on this host
    ///
    /// The process is returned without waiting for it; the caller owns it.
    async fn start_runner(&self, launch: RunnerLaunch) -> Result<Child, Self::Error>;

    /// All registered runners
    async fn runners(&self) -> Result<Vec<Runner>, Self::Error>;

    /// A single runner by id
    async fn runner(&self, runner_id: u64) -> Result<Runner, Self::Error>;

    /// Opens a pull request, returning its web URL
    async fn pr_create(&self, request: CreatePullRequest) -> Result<String, Self::Error>;

    /// Comments on a pull request, returning the comment's web URL
    async fn pr_comment_create(&self, report: &str, pr_number: u64) -> Result<String, Self::Error>;

    /// Replaces the body of a pull request comment, returning its web URL
    async fn pr_comment_update(&self, report: &str, comment_id: u64) -> Result<String, Self::Error>;

    /// All comments on a pull request
    async fn pr_comments(&self, pr_number: u64) -> Result<Vec<Comment>, Self::Error>;

    /// Pull requests in the given state
    async fn prs(&self, state: PrState) -> Result<Vec<PullRequest>, Self::Error>;

    /// Re-runs a pipeline unless it is still running; `None` means the current run
    async fn pipeline_rerun(&self, run_id: Option<u64>) -> Result<(), Self::Error>;

    /// Re-runs the pipeline a job belongs to unless it is still running
    async fn pipeline_restart(&self, job_id: u64) -> Result<(), Self::Error>;

    /// Looks up jobs by id, in input order
    async fn pipeline_jobs(&self, job_ids: &[u64]) -> Result<Vec<Job>, Self::Error>;

    /// The job with the given status whose start time is closest to `time`
    async fn job(&self, time: DateTime<Utc>, status: Option<&str>) -> Result<Job, Self::Error>;

    /// Renders a shell command that points git at this platform with the driver's credentials
    fn update_git_config(
        &self,
        user_name: Option<&str>,
        user_email: Option<&str>,
    ) -> Result<String, Self::Error>;
}
