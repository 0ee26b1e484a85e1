//! [`CiDriver`] implementation for GitHub

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gantry_core::CiDriver;
use gantry_core::domain::check::CheckRequest;
use gantry_core::domain::comment::Comment;
use gantry_core::domain::job::Job;
use gantry_core::domain::pull_request::{CreatePullRequest, PrState, PullRequest};
use gantry_core::domain::runner::{Runner, RunnerLaunch};
use gantry_core::driver::Capabilities;
use std::path::Path;
use tokio::process::Child;

use crate::GitHubClient;
use crate::error::{ClientError, Result};

#[async_trait]
impl CiDriver for GitHubClient {
    type Error = ClientError;

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            artifact_upload: false,
            runner_registration: false,
            organization_runners: true,
        }
    }

    async fn comment_create(&self, report: &str, commit_sha: &str) -> Result<String> {
        GitHubClient::comment_create(self, report, commit_sha).await
    }

    async fn comment_update(&self, report: &str, comment_id: u64) -> Result<String> {
        GitHubClient::comment_update(self, report, comment_id).await
    }

    async fn commit_comments(&self, commit_sha: &str) -> Result<Vec<Comment>> {
        GitHubClient::commit_comments(self, commit_sha).await
    }

    async fn commit_prs(&self, commit_sha: &str, state: PrState) -> Result<Vec<PullRequest>> {
        GitHubClient::commit_prs(self, commit_sha, state).await
    }

    async fn check_create(&self, request: CheckRequest) -> Result<serde_json::Value> {
        GitHubClient::check_create(self, request).await
    }

    async fn upload(&self, path: &Path) -> Result<()> {
        GitHubClient::upload(self, path).await
    }

    async fn runner_token(&self) -> Result<String> {
        GitHubClient::runner_token(self).await
    }

    async fn register_runner(&self, name: &str, labels: &[String]) -> Result<()> {
        GitHubClient::register_runner(self, name, labels).await
    }

    async fn unregister_runner(&self, runner_id: u64) -> Result<()> {
        GitHubClient::unregister_runner(self, runner_id).await
    }

    async fn start_runner(&self, launch: RunnerLaunch) -> Result<Child> {
        GitHubClient::start_runner(self, launch).await
    }

    async fn runners(&self) -> Result<Vec<Runner>> {
        GitHubClient::runners(self).await
    }

    async fn runner(&self, runner_id: u64) -> Result<Runner> {
        GitHubClient::runner(self, runner_id).await
    }

    async fn pr_create(&self, request: CreatePullRequest) -> Result<String> {
        GitHubClient::pr_create(self, request).await
    }

    async fn pr_comment_create(&self, report: &str, pr_number: u64) -> Result<String> {
        GitHubClient::pr_comment_create(self, report, pr_number).await
    }

    async fn pr_comment_update(&self, report: &str, comment_id: u64) -> Result<String> {
        GitHubClient::pr_comment_update(self, report, comment_id).await
    }

    async fn pr_comments(&self, pr_number: u64) -> Result<Vec<Comment>> {
        GitHubClient::pr_comments(self, pr_number).await
    }

    async fn prs(&self, state: PrState) -> Result<Vec<PullRequest>> {
        GitHubClient::prs(self, state).await
    }

    async fn pipeline_rerun(&self, run_id: Option<u64>) -> Result<()> {
        GitHubClient::pipeline_rerun(self, run_id).await
    }

    async fn pipeline_restart(&self, job_id: u64) -> Result<()> {
        GitHubClient::pipeline_restart(self, job_id).await
    }

    async fn pipeline_jobs(&self, job_ids: &[u64]) -> Result<Vec<Job>> {
        GitHubClient::pipeline_jobs(self, job_ids).await
    }

    async fn job(&self, time: DateTime<Utc>, status: Option<&str>) -> Result<Job> {
        GitHubClient::job(self, time, status).await
    }

    fn update_git_config(&self, user_name: Option<&str>, user_email: Option<&str>) -> Result<String> {
        GitHubClient::update_git_config(self, user_name, user_email)
    }
}
