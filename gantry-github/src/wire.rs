//! GitHub REST payloads
//!
//! Only the fields the driver reads are modeled; serde ignores the rest.

use chrono::{DateTime, Utc};
use gantry_core::domain::branch_name;
use gantry_core::domain::check::{CheckConclusion, CheckStatus};
use gantry_core::domain::comment::Comment;
use gantry_core::domain::job::Job;
use gantry_core::domain::pull_request::PullRequest;
use gantry_core::domain::runner::Runner;
use serde::{Deserialize, Serialize};

use crate::pagination::Page;

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct CommentBody<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePull<'a> {
    pub head: &'a str,
    pub base: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCheckRun<'a> {
    pub name: &'a str,
    pub head_sha: &'a str,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub conclusion: CheckConclusion,
    pub status: CheckStatus,
    pub output: CheckOutput<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckOutput<'a> {
    pub title: &'a str,
    pub summary: &'a str,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct CommentPayload {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
}

impl From<CommentPayload> for Comment {
    fn from(c: CommentPayload) -> Self {
        Comment {
            id: c.id,
            body: c.body.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BranchRef {
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullPayload {
    pub html_url: String,
    #[serde(default)]
    pub state: String,
    pub head: BranchRef,
    pub base: BranchRef,
}

impl From<PullPayload> for PullRequest {
    fn from(pr: PullPayload) -> Self {
        PullRequest {
            url: pr.html_url,
            source: branch_name(&pr.head.git_ref).to_string(),
            target: branch_name(&pr.base.git_ref).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationToken {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunnerLabel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunnerPayload {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub busy: bool,
    #[serde(default)]
    pub labels: Vec<RunnerLabel>,
}

impl From<RunnerPayload> for Runner {
    fn from(r: RunnerPayload) -> Self {
        Runner {
            id: r.id,
            name: r.name,
            labels: r.labels.into_iter().map(|l| l.name).collect(),
            online: r.status == "online",
            busy: r.busy,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunnersPage {
    pub runners: Vec<RunnerPayload>,
}

impl Page for RunnersPage {
    type Item = RunnerPayload;

    fn into_items(self) -> Vec<RunnerPayload> {
        self.runners
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunsPage {
    pub workflow_runs: Vec<WorkflowRun>,
}

impl Page for WorkflowRunsPage {
    type Item = WorkflowRun;

    fn into_items(self) -> Vec<WorkflowRun> {
        self.workflow_runs
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowJob {
    pub id: u64,
    pub run_id: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

impl From<WorkflowJob> for Job {
    fn from(j: WorkflowJob) -> Self {
        Job {
            id: j.id,
            date: j.started_at,
            run_id: j.run_id,
            status: j.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobsPage {
    pub jobs: Vec<WorkflowJob>,
}

impl Page for JobsPage {
    type Item = WorkflowJob;

    fn into_items(self) -> Vec<WorkflowJob> {
        self.jobs
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Release {
    pub tag_name: String,
}
