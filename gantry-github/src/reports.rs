//! Commit comments, checks and artifact publishing

use chrono::Utc;
use gantry_core::domain::check::{CheckRequest, DEFAULT_CHECK_TITLE};
use gantry_core::domain::comment::Comment;
use reqwest::Method;
use std::path::Path;
use tracing::{debug, warn};

use crate::GitHubClient;
use crate::config::CiContext;
use crate::error::{ClientError, Result};
use crate::pagination::PER_PAGE;
use crate::wire::{CheckOutput, CommentBody, CommentPayload, CreateCheckRun};

const CHECK_CONTEXT_WARNING: &str = "This command only works inside a Github runner or a Github app.";

/// Whether check runs are likely to be rejected: not in CI, or the ambient
/// `GITHUB_TOKEN` is not the token we authenticate with
fn outside_check_context(context: &CiContext, token: &str) -> bool {
    !context.in_ci
        || context
            .ambient_token
            .as_deref()
            .is_some_and(|ambient| ambient != token)
}

impl GitHubClient {
    // =============================================================================
    // Commit Comments
    // =============================================================================

    /// Comment on a commit
    ///
    /// # Arguments
    /// * `report` - Markdown body
    /// * `commit_sha` - Commit to comment on
    ///
    /// # Returns
    /// The web URL of the new comment
    pub async fn comment_create(&self, report: &str, commit_sha: &str) -> Result<String> {
        let (owner, repo) = self.repository("comment_create")?;
        let url = self.endpoint(&format!(
            "/repos/{}/{}/commits/{}/comments",
            owner, repo, commit_sha
        ));
        let response = self
            .send(
                self.request(Method::POST, &url)
                    .json(&CommentBody { body: report }),
            )
            .await?;

        let comment: CommentPayload = self.handle_response(response).await?;
        Ok(comment.html_url)
    }

    /// Replace the body of a commit comment
    ///
    /// # Returns
    /// The web URL of the updated comment
    pub async fn comment_update(&self, report: &str, comment_id: u64) -> Result<String> {
        let (owner, repo) = self.repository("comment_update")?;
        let url = self.endpoint(&format!("/repos/{}/{}/comments/{}", owner, repo, comment_id));
        let response = self
            .send(
                self.request(Method::PATCH, &url)
                    .json(&CommentBody { body: report }),
            )
            .await?;

        let comment: CommentPayload = self.handle_response(response).await?;
        Ok(comment.html_url)
    }

    /// List every comment on a commit, across all pages
    pub async fn commit_comments(&self, commit_sha: &str) -> Result<Vec<Comment>> {
        let (owner, repo) = self.repository("commit_comments")?;
        let url = self.endpoint(&format!(
            "/repos/{}/{}/commits/{}/comments?per_page={}",
            owner, repo, commit_sha, PER_PAGE
        ));

        let comments = self.paginate::<Vec<CommentPayload>>(url).await?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }

    // =============================================================================
    // Checks
    // =============================================================================

    /// Publish a check run
    ///
    /// Unset request fields take their defaults; the head SHA falls back to
    /// the CI context. A warning is logged outside CI, or when the job's own
    /// `GITHUB_TOKEN` differs from the configured token, since GitHub only
    /// accepts check runs from Actions or GitHub Apps.
    ///
    /// # Returns
    /// The raw check run payload
    pub async fn check_create(&self, request: CheckRequest) -> Result<serde_json::Value> {
        let (owner, repo) = self.repository("check_create")?;

        let context = &self.config.context;
        if outside_check_context(context, &self.token) {
            warn!("{}", CHECK_CONTEXT_WARNING);
        }

        let head_sha = request
            .head_sha
            .as_deref()
            .or(context.sha())
            .ok_or_else(|| ClientError::Config("head SHA not found".to_string()))?;
        let title = request.title.as_deref().unwrap_or(DEFAULT_CHECK_TITLE);
        let now = Utc::now();

        let body = CreateCheckRun {
            name: title,
            head_sha,
            started_at: request.started_at.unwrap_or(now),
            completed_at: request.completed_at.unwrap_or(now),
            conclusion: request.conclusion.unwrap_or_default(),
            status: request.status.unwrap_or_default(),
            output: CheckOutput {
                title,
                summary: &request.report,
            },
        };

        debug!("Creating check '{}' on {}", title, head_sha);
        let url = self.endpoint(&format!("/repos/{}/{}/check-runs", owner, repo));
        let response = self
            .send(self.request(Method::POST, &url).json(&body))
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Artifacts
    // =============================================================================

    /// Publish a report artifact
    ///
    /// GitHub has no artifact store reachable from this API, so this always fails.
    pub async fn upload(&self, _path: &Path) -> Result<()> {
        Err(ClientError::Unsupported(
            "Github does not support publish!".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CiContext;
    use crate::test_support::{client_for, client_with};
    use gantry_core::domain::check::CheckConclusion;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_comment_create_returns_html_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/owner/repo/commits/abc123/comments")
            .match_body(Matcher::Json(json!({"body": "## Report"})))
            .with_status(201)
            .with_body(
                json!({
                    "id": 7,
                    "body": "## Report",
                    "html_url": "https://github.com/owner/repo/commit/abc123#commitcomment-7"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let url = client_for(&server)
            .comment_create("## Report", "abc123")
            .await
            .unwrap();

        assert_eq!(url, "https://github.com/owner/repo/commit/abc123#commitcomment-7");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_comment_update() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/repos/owner/repo/comments/7")
            .match_body(Matcher::Json(json!({"body": "updated"})))
            .with_status(200)
            .with_body(
                json!({"id": 7, "body": "updated", "html_url": "https://github.com/c/7"})
                    .to_string(),
            )
            .create_async()
            .await;

        let url = client_for(&server)
            .comment_update("updated", 7)
            .await
            .unwrap();
        assert_eq!(url, "https://github.com/c/7");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_commit_comments_drains_all_pages() {
        let mut server = mockito::Server::new_async().await;
        let next = format!(
            "<{}/repos/owner/repo/commits/abc/comments?per_page=100&page=2>; rel=\"next\"",
            server.url()
        );
        let first = server
            .mock("GET", "/repos/owner/repo/commits/abc/comments")
            .match_query(Matcher::Exact("per_page=100".to_string()))
            .with_status(200)
            .with_header("link", &next)
            .with_body(
                json!([
                    {"id": 1, "body": "one", "html_url": "u1"},
                    {"id": 2, "body": "two", "html_url": "u2"}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/repos/owner/repo/commits/abc/comments")
            .match_query(Matcher::Exact("per_page=100&page=2".to_string()))
            .with_status(200)
            .with_body(json!([{"id": 3, "body": null, "html_url": "u3"}]).to_string())
            .create_async()
            .await;

        let comments = client_for(&server).commit_comments("abc").await.unwrap();

        let ids: Vec<u64> = comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(comments[0].body, "one");
        assert_eq!(comments[2].body, "");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[test]
    fn test_check_context_warning_conditions() {
        let in_ci = |ambient: Option<&str>| CiContext {
            in_ci: true,
            ambient_token: ambient.map(str::to_string),
            ..Default::default()
        };

        assert!(!outside_check_context(&in_ci(Some("t")), "t"));
        assert!(!outside_check_context(&in_ci(None), "t"));
        assert!(outside_check_context(&in_ci(Some("other")), "t"));
        assert!(outside_check_context(&CiContext::default(), "t"));
    }

    #[tokio::test]
    async fn test_check_create_applies_defaults() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/owner/repo/check-runs")
            .match_body(Matcher::PartialJson(json!({
                "name": "CI Report",
                "head_sha": "ctxsha",
                "conclusion": "success",
                "status": "completed",
                "output": {"title": "CI Report", "summary": "all good"}
            })))
            .with_status(201)
            .with_body(json!({"id": 99, "name": "CI Report"}).to_string())
            .create_async()
            .await;

        let context = CiContext {
            sha: Some("ctxsha".to_string()),
            in_ci: true,
            ..Default::default()
        };
        let client = client_with(&server, "owner/repo", context);
        let payload = client
            .check_create(CheckRequest::new("all good"))
            .await
            .unwrap();

        assert_eq!(payload["id"], 99);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_create_explicit_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/owner/repo/check-runs")
            .match_body(Matcher::PartialJson(json!({
                "name": "Metrics",
                "head_sha": "deadbeef",
                "conclusion": "failure"
            })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let request = CheckRequest::new("regressed")
            .head_sha("deadbeef")
            .title("Metrics")
            .conclusion(CheckConclusion::Failure);
        client_for(&server).check_create(request).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_create_without_sha_fails() {
        let server = mockito::Server::new_async().await;
        let err = client_for(&server)
            .check_create(CheckRequest::new("report"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_upload_unsupported() {
        let server = mockito::Server::new_async().await;
        let err = client_for(&server)
            .upload(Path::new("report.md"))
            .await
            .unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "Github does not support publish!");
    }

    #[tokio::test]
    async fn test_comments_require_repository() {
        let server = mockito::Server::new_async().await;
        let client = client_with(&server, "https://github.com/acme", CiContext::default());
        let err = client.comment_create("x", "abc").await.unwrap_err();
        assert!(matches!(err, ClientError::RepositoryRequired("comment_create")));
    }
}
