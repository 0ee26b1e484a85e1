//! Gantry GitHub Driver
//!
//! Maps Gantry's CI operations (commit and pull request comments, checks,
//! self-hosted runners, workflow runs) onto the GitHub REST API.
//!
//! [`GitHubClient`] implements [`gantry_core::CiDriver`], so orchestration
//! code can target it through the same interface as any other platform.
//!
//! # Example
//!
//! ```no_run
//! use gantry_github::{ClientConfig, GitHubClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GitHubClient::new(ClientConfig::new("acme/widgets", "ghp_token"))?;
//!
//!     let url = client.comment_create("## Report", "4f2c1e9").await?;
//!     println!("Commented: {}", url);
//!     Ok(())
//! }
//! ```

pub mod config;
mod driver;
pub mod error;
mod git;
mod pagination;
mod pipelines;
mod provision;
mod pulls;
mod reports;
mod runners;
pub mod throttle;
mod wire;

// Re-export commonly used types
pub use config::{CiContext, ClientConfig};
pub use error::{ClientError, Result};
pub use gantry_core::RepoRef;
pub use throttle::{LimitKind, RetryLimit, ThrottleHandler};

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Public GitHub API base
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// REST API version pinned on every request
const API_VERSION: &str = "2022-11-28";

const USER_AGENT_VALUE: &str = concat!("gantry-github/", env!("CARGO_PKG_VERSION"));

/// GitHub implementation of the Gantry CI driver
///
/// Operations are grouped by concern:
/// - Commit and pull request comments, checks
/// - Pull request creation and queries
/// - Self-hosted runner registration, listing and launch
/// - Workflow run re-runs and job lookups
///
/// The client is cheap to clone; clones share the HTTP connection pool and
/// throttle handler.
#[derive(Clone)]
pub struct GitHubClient {
    /// Repository (or organization) web URL, without trailing slash
    repo: String,
    /// Parsed form of `repo`
    repo_ref: RepoRef,
    token: String,
    /// REST API base URL, without trailing slash
    api_base: String,
    config: ClientConfig,
    client: Client,
    throttle: Arc<dyn ThrottleHandler>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// Fails without touching the network if the repository or token is
    /// missing, or if the repository cannot be parsed.
    ///
    /// # Example
    /// ```
    /// use gantry_github::{ClientConfig, GitHubClient};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let client = GitHubClient::new(ClientConfig::new("acme/widgets", "ghp_token"))?;
    /// assert_eq!(client.repo_url(), "https://github.com/acme/widgets");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_client(config, Client::new())
    }

    /// Create a new GitHub client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(config: ClientConfig, client: Client) -> Result<Self> {
        config.validate()?;

        let url = gantry_core::domain::repo::to_url(&config.repo)?;
        let repo_ref = RepoRef::parse(url.as_str())?;
        let repo = url.as_str().trim_end_matches('/').to_string();

        let api_base = match &config.api_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => api_base_for(&url),
        };

        debug!("GitHub client for {} using API {}", repo_ref, api_base);

        Ok(Self {
            repo,
            repo_ref,
            token: config.token.clone(),
            api_base,
            config,
            client,
            throttle: Arc::new(RetryLimit::default()),
        })
    }

    /// Replace the rate-limit handler
    pub fn with_throttle(mut self, handler: impl ThrottleHandler + 'static) -> Self {
        self.throttle = Arc::new(handler);
        self
    }

    /// Repository web URL the client targets
    pub fn repo_url(&self) -> &str {
        &self.repo
    }

    /// REST API base URL
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolve the configured repository, or `uri` when given
    pub fn owner_repo(&self, uri: Option<&str>) -> Result<RepoRef> {
        match uri {
            Some(uri) => Ok(RepoRef::parse(uri)?),
            None => Ok(self.repo_ref.clone()),
        }
    }

    /// Commit under test, from the CI context
    pub fn sha(&self) -> Option<&str> {
        self.config.context.sha()
    }

    /// Branch under test, from the CI context
    pub fn branch(&self) -> Option<&str> {
        self.config.context.branch()
    }

    /// Owner and repository, or an error naming `operation` for organization scope
    fn repository(&self, operation: &'static str) -> Result<(&str, &str)> {
        match &self.repo_ref {
            RepoRef::Repository { owner, repo } => Ok((owner, repo)),
            RepoRef::Organization { .. } => Err(ClientError::RepositoryRequired(operation)),
        }
    }

    /// Absolute URL of an API path
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    // =============================================================================
    // Request Execution
    // =============================================================================

    /// Build an authenticated request
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(USER_AGENT, USER_AGENT_VALUE)
    }

    /// Send a request, retrying throttled responses while the handler allows
    ///
    /// Non-throttled 403/429 responses are turned into API errors here, since
    /// their body had to be read to classify them.
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut retry_count = 0;

        loop {
            let Some(attempt) = builder.try_clone() else {
                return Ok(builder.send().await?);
            };

            let response = attempt.send().await?;
            let status = response.status();
            if status != reqwest::StatusCode::FORBIDDEN
                && status != reqwest::StatusCode::TOO_MANY_REQUESTS
            {
                return Ok(response);
            }

            let headers = response.headers().clone();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let Some(kind) = throttle::classify(status, &headers, &body) else {
                return Err(ClientError::api_error(status.as_u16(), body));
            };

            let delay = throttle::retry_delay(&headers, chrono::Utc::now());
            if !self.throttle.on_limit(kind, delay, retry_count) {
                return Err(ClientError::api_error(status.as_u16(), body));
            }

            tokio::time::sleep(delay).await;
            retry_count += 1;
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

/// REST API base for a repository URL: public GitHub or an Enterprise server
fn api_base_for(repo: &Url) -> String {
    match repo.host_str() {
        Some("github.com") | None => GITHUB_API_URL.to_string(),
        Some(host) => match repo.port() {
            Some(port) => format!("https://{}:{}/api/v3", host, port),
            None => format!("https://{}/api/v3", host),
        },
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TOKEN, client_for};
    use mockito::Matcher;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[test]
    fn test_client_requires_repo_and_token() {
        let missing_repo = GitHubClient::new(ClientConfig::new("", "tkn")).unwrap_err();
        assert_eq!(missing_repo.to_string(), "repo not found");

        let missing_token = GitHubClient::new(ClientConfig::new("owner/repo", "")).unwrap_err();
        assert_eq!(missing_token.to_string(), "token not found");
    }

    #[test]
    fn test_client_normalizes_repo() {
        let client = GitHubClient::new(ClientConfig::new("https://github.com/owner/repo/", "t"))
            .unwrap();
        assert_eq!(client.repo_url(), "https://github.com/owner/repo");
        assert_eq!(client.api_base(), GITHUB_API_URL);

        let slug = GitHubClient::new(ClientConfig::new("owner/repo", "t")).unwrap();
        assert_eq!(slug.repo_url(), "https://github.com/owner/repo");
        assert_eq!(
            slug.owner_repo(None).unwrap(),
            client.owner_repo(None).unwrap()
        );
    }

    #[test]
    fn test_owner_repo_override() {
        let client = GitHubClient::new(ClientConfig::new("owner/repo", "t")).unwrap();
        let other = client
            .owner_repo(Some("https://github.com/other/thing"))
            .unwrap();
        assert_eq!(other.owner(), "other");
        assert_eq!(other.repo(), Some("thing"));
    }

    #[test]
    fn test_enterprise_api_base() {
        let client =
            GitHubClient::new(ClientConfig::new("https://git.corp.example/team/svc", "t"))
                .unwrap();
        assert_eq!(client.api_base(), "https://git.corp.example/api/v3");
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GitHubClient::new(ClientConfig::new("owner/repo", "ghp_secret")).unwrap();
        assert!(!format!("{:?}", client).contains("ghp_secret"));
    }

    #[tokio::test]
    async fn test_requests_are_authenticated() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/owner/repo/actions/runs/1")
            .match_header("authorization", format!("Bearer {}", TOKEN).as_str())
            .match_header("accept", "application/vnd.github+json")
            .match_header("x-github-api-version", API_VERSION)
            .match_header("user-agent", Matcher::Regex("^gantry-github/".to_string()))
            .with_status(200)
            .with_body(r#"{"id":1,"status":"completed"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client
            .send(client.request(Method::GET, &client.endpoint("/repos/owner/repo/actions/runs/1")))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_retried_five_times() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/limited")
            .with_status(429)
            .with_header("retry-after", "0")
            .with_body("slow down")
            .expect(6)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .send(client.request(Method::GET, &client.endpoint("/limited")))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ApiError { status: 429, .. }));
        mock.assert_async().await;
    }

    struct Counting {
        calls: AtomicU32,
        allow: u32,
    }

    impl ThrottleHandler for Counting {
        fn on_limit(&self, _kind: LimitKind, _after: Duration, retry_count: u32) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            retry_count < self.allow
        }
    }

    #[tokio::test]
    async fn test_custom_throttle_handler() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/abuse")
            .with_status(403)
            .with_header("retry-after", "0")
            .with_body(r#"{"message":"You have exceeded a secondary rate limit"}"#)
            .expect(3)
            .create_async()
            .await;

        let handler = Arc::new(Counting {
            calls: AtomicU32::new(0),
            allow: 2,
        });
        let client = client_for(&server).with_throttle(ArcHandler(handler.clone()));
        let err = client
            .send(client.request(Method::GET, &client.endpoint("/abuse")))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::ApiError { status: 403, .. }));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
        mock.assert_async().await;
    }

    struct ArcHandler(Arc<Counting>);

    impl ThrottleHandler for ArcHandler {
        fn on_limit(&self, kind: LimitKind, after: Duration, retry_count: u32) -> bool {
            self.0.on_limit(kind, after, retry_count)
        }
    }

    #[tokio::test]
    async fn test_plain_forbidden_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/forbidden")
            .with_status(403)
            .with_body("Resource not accessible by integration")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .send(client.request(Method::GET, &client.endpoint("/forbidden")))
            .await
            .unwrap_err();

        match err {
            ClientError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("not accessible"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        mock.assert_async().await;
    }
}
