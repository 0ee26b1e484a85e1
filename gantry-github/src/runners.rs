//! Self-hosted runner endpoints

use gantry_core::RepoRef;
use gantry_core::domain::runner::Runner;
use reqwest::Method;
use tracing::info;

use crate::GitHubClient;
use crate::error::{ClientError, Result};
use crate::pagination::PER_PAGE;
use crate::wire::{RegistrationToken, RunnerPayload, RunnersPage};

impl GitHubClient {
    /// API path prefix owning the runners: the repository or the organization
    fn runner_scope(&self) -> String {
        match &self.repo_ref {
            RepoRef::Repository { owner, repo } => format!("/repos/{}/{}", owner, repo),
            RepoRef::Organization { owner } => format!("/orgs/{}", owner),
        }
    }

    // =============================================================================
    // Runner Registration & Lifecycle
    // =============================================================================

    /// Fetch a registration token for configuring a new runner
    pub async fn runner_token(&self) -> Result<String> {
        let url = self.endpoint(&format!(
            "{}/actions/runners/registration-token",
            self.runner_scope()
        ));
        let response = self.send(self.request(Method::POST, &url)).await?;

        let token: RegistrationToken = self.handle_response(response).await?;
        Ok(token.token)
    }

    /// Register a runner through the API
    ///
    /// GitHub runners register themselves with `config.sh` (see
    /// [`GitHubClient::start_runner`]), so this always fails.
    pub async fn register_runner(&self, _name: &str, _labels: &[String]) -> Result<()> {
        Err(ClientError::Unsupported(
            "Github does not support registerRunner!".to_string(),
        ))
    }

    /// Delete a runner registration
    ///
    /// # Arguments
    /// * `runner_id` - The runner ID to delete
    pub async fn unregister_runner(&self, runner_id: u64) -> Result<()> {
        let url = self.endpoint(&format!(
            "{}/actions/runners/{}",
            self.runner_scope(),
            runner_id
        ));
        let response = self.send(self.request(Method::DELETE, &url)).await?;

        self.handle_empty_response(response).await?;
        info!("Unregistered runner {} from {}", runner_id, self.repo_ref);
        Ok(())
    }

    // =============================================================================
    // Runner Query
    // =============================================================================

    /// List all registered runners, across all pages
    pub async fn runners(&self) -> Result<Vec<Runner>> {
        let url = self.endpoint(&format!(
            "{}/actions/runners?per_page={}",
            self.runner_scope(),
            PER_PAGE
        ));

        let runners = self.paginate::<RunnersPage>(url).await?;
        Ok(runners.into_iter().map(Runner::from).collect())
    }

    /// Get details for a specific runner
    pub async fn runner(&self, runner_id: u64) -> Result<Runner> {
        let url = self.endpoint(&format!(
            "{}/actions/runners/{}",
            self.runner_scope(),
            runner_id
        ));
        let response = self.send(self.request(Method::GET, &url)).await?;

        let runner: RunnerPayload = self.handle_response(response).await?;
        Ok(runner.into())
    }
}
