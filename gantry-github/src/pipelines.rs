//! Workflow run and job endpoints

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use gantry_core::domain::job::{Job, closest_job, is_running};
use reqwest::Method;
use tracing::{debug, info};
use url::Url;

use crate::GitHubClient;
use crate::error::{ClientError, Result};
use crate::pagination::PER_PAGE;
use crate::wire::{JobsPage, WorkflowJob, WorkflowRun, WorkflowRunsPage};

/// Status filter `job` uses when none is given
const DEFAULT_JOB_STATUS: &str = "queued";

impl GitHubClient {
    async fn workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<WorkflowRun> {
        let url = self.endpoint(&format!("/repos/{}/{}/actions/runs/{}", owner, repo, run_id));
        let response = self.send(self.request(Method::GET, &url)).await?;
        self.handle_response(response).await
    }

    async fn workflow_job(&self, owner: &str, repo: &str, job_id: u64) -> Result<WorkflowJob> {
        let url = self.endpoint(&format!("/repos/{}/{}/actions/jobs/{}", owner, repo, job_id));
        let response = self.send(self.request(Method::GET, &url)).await?;
        self.handle_response(response).await
    }

    async fn rerun(&self, owner: &str, repo: &str, run_id: u64) -> Result<()> {
        let url = self.endpoint(&format!(
            "/repos/{}/{}/actions/runs/{}/rerun",
            owner, repo, run_id
        ));
        let response = self.send(self.request(Method::POST, &url)).await?;
        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Pipeline Control
    // =============================================================================

    /// Re-run a workflow run unless it is still running
    ///
    /// # Arguments
    /// * `run_id` - The run to re-trigger; `None` uses the current run from the CI context
    pub async fn pipeline_rerun(&self, run_id: Option<u64>) -> Result<()> {
        let (owner, repo) = self.repository("pipeline_rerun")?;
        let run_id = run_id
            .or(self.config.context.run_id)
            .ok_or_else(|| ClientError::Config("run id not found".to_string()))?;

        let run = self.workflow_run(owner, repo, run_id).await?;
        if run.status.as_deref().is_some_and(is_running) {
            debug!("Run {} is still running, not re-running", run_id);
            return Ok(());
        }

        info!("Re-running workflow run {}", run_id);
        self.rerun(owner, repo, run_id).await
    }

    /// Re-run the workflow run a job belongs to, unless it is still running
    ///
    /// A failing re-run request is ignored.
    pub async fn pipeline_restart(&self, job_id: u64) -> Result<()> {
        let (owner, repo) = self.repository("pipeline_restart")?;

        let job = self.workflow_job(owner, repo, job_id).await?;
        let run = self.workflow_run(owner, repo, job.run_id).await?;
        if run.status.as_deref().is_some_and(is_running) {
            debug!("Run {} of job {} is still running", job.run_id, job_id);
            return Ok(());
        }

        info!("Restarting workflow run {} for job {}", job.run_id, job_id);
        if let Err(e) = self.rerun(owner, repo, job.run_id).await {
            debug!("Ignoring failed re-run of {}: {}", job.run_id, e);
        }
        Ok(())
    }

    // =============================================================================
    // Job Query
    // =============================================================================

    /// Look up jobs by id
    ///
    /// Requests are issued concurrently; results keep the order of `job_ids`.
    pub async fn pipeline_jobs(&self, job_ids: &[u64]) -> Result<Vec<Job>> {
        let (owner, repo) = self.repository("pipeline_jobs")?;

        let jobs = try_join_all(
            job_ids
                .iter()
                .map(|&job_id| self.workflow_job(owner, repo, job_id)),
        )
        .await?;

        Ok(jobs.into_iter().map(Job::from).collect())
    }

    /// Find the job whose start time is closest to `time`
    ///
    /// Lists workflow runs with the given status (default `queued`), fetches
    /// the jobs of every run concurrently, and picks the nearest start time.
    /// On ties the job listed first wins.
    pub async fn job(&self, time: DateTime<Utc>, status: Option<&str>) -> Result<Job> {
        let (owner, repo) = self.repository("job")?;
        let status = status.unwrap_or(DEFAULT_JOB_STATUS);

        let runs_endpoint = self.endpoint(&format!("/repos/{}/{}/actions/runs", owner, repo));
        let mut runs_url = Url::parse(&runs_endpoint)
            .map_err(|e| ClientError::Config(format!("invalid API URL: {}", e)))?;
        runs_url
            .query_pairs_mut()
            .append_pair("status", status)
            .append_pair("per_page", &PER_PAGE.to_string());
        let runs = self.paginate::<WorkflowRunsPage>(runs_url.to_string()).await?;
        debug!("Found {} {} workflow runs", runs.len(), status);

        let run_jobs = try_join_all(runs.iter().map(|run| {
            let url = self.endpoint(&format!(
                "/repos/{}/{}/actions/runs/{}/jobs?per_page={}",
                owner, repo, run.id, PER_PAGE
            ));
            self.paginate::<JobsPage>(url)
        }))
        .await?;

        let jobs: Vec<Job> = run_jobs.into_iter().flatten().map(Job::from).collect();
        closest_job(&jobs, time)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("no {} jobs", status)))
    }
}
