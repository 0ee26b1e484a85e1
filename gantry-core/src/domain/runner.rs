//! Runner domain model
//!
//! Represents a self-hosted CI execution agent registered against a
//! repository or an organization.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A self-hosted runner as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    /// Platform runner identifier
    pub id: u64,

    /// Display name chosen at registration
    pub name: String,

    /// Label names attached to the runner
    pub labels: Vec<String>,

    /// Whether the runner is connected to the platform
    pub online: bool,

    /// Whether the runner is currently executing a job
    pub busy: bool,
}

/// Parameters for configuring and starting a runner on this host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerLaunch {
    /// Directory holding the runner binaries and its work tree
    pub workdir: PathBuf,

    /// Deregister the runner after a single job
    pub ephemeral: bool,

    /// Runner name
    pub name: String,

    /// Labels for job matching
    pub labels: Vec<String>,
}

impl RunnerLaunch {
    pub fn new(workdir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            workdir: workdir.into(),
            ephemeral: false,
            name: name.into(),
            labels: Vec::new(),
        }
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}
