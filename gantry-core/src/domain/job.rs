//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single job of a workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,

    /// When the job started, if it has
    pub date: Option<DateTime<Utc>>,

    /// Workflow run the job belongs to
    pub run_id: u64,

    /// Platform status string (e.g. `queued`, `in_progress`, `completed`)
    pub status: Option<String>,
}

impl Job {
    /// Start time in milliseconds since the epoch; jobs that have not started count as 0
    fn start_millis(&self) -> i64 {
        self.date.map(|d| d.timestamp_millis()).unwrap_or(0)
    }
}

/// Returns the job whose start time is closest to `target`.
///
/// Scans in order and keeps the first job with the smallest distance, so on
/// ties the earlier job wins. Returns `None` for an empty slice.
pub fn closest_job(jobs: &[Job], target: DateTime<Utc>) -> Option<&Job> {
    let target = target.timestamp_millis();
    let distance = |job: &Job| (job.start_millis() - target).abs();

    let mut jobs = jobs.iter();
    let mut best = jobs.next()?;
    for job in jobs {
        if distance(job) < distance(best) {
            best = job;
        }
    }
    Some(best)
}

/// Whether a platform run/job status means the work is still executing
pub fn is_running(status: &str) -> bool {
    matches!(status, "running" | "in_progress")
}
