//! Pull request endpoints

use gantry_core::domain::comment::Comment;
use gantry_core::domain::pull_request::{CreatePullRequest, PrState, PullRequest};
use reqwest::Method;

use crate::GitHubClient;
use crate::error::Result;
use crate::pagination::PER_PAGE;
use crate::wire::{CommentBody, CommentPayload, CreatePull, PullPayload};

impl GitHubClient {
    // =============================================================================
    // Pull Requests
    // =============================================================================

    /// Open a pull request
    ///
    /// # Returns
    /// The web URL of the pull request
    pub async fn pr_create(&self, req: CreatePullRequest) -> Result<String> {
        let (owner, repo) = self.repository("pr_create")?;
        let url = self.endpoint(&format!("/repos/{}/{}/pulls", owner, repo));
        let response = self
            .send(self.request(Method::POST, &url).json(&CreatePull {
                head: &req.source,
                base: &req.target,
                title: &req.title,
                body: &req.description,
            }))
            .await?;

        let pr: PullPayload = self.handle_response(response).await?;
        Ok(pr.html_url)
    }

    /// List pull requests in the given state, across all pages
    pub async fn prs(&self, state: PrState) -> Result<Vec<PullRequest>> {
        let (owner, repo) = self.repository("prs")?;
        let url = self.endpoint(&format!(
            "/repos/{}/{}/pulls?state={}&per_page={}",
            owner, repo, state, PER_PAGE
        ));

        let prs = self.paginate::<Vec<PullPayload>>(url).await?;
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    /// List pull requests associated with a commit
    ///
    /// The endpoint has no state filter, so `state` is applied here.
    pub async fn commit_prs(&self, commit_sha: &str, state: PrState) -> Result<Vec<PullRequest>> {
        let (owner, repo) = self.repository("commit_prs")?;
        let url = self.endpoint(&format!(
            "/repos/{}/{}/commits/{}/pulls",
            owner, repo, commit_sha
        ));
        let response = self.send(self.request(Method::GET, &url)).await?;

        let prs: Vec<PullPayload> = self.handle_response(response).await?;
        Ok(prs
            .into_iter()
            .filter(|pr| state.includes(&pr.state))
            .map(PullRequest::from)
            .collect())
    }

    // =============================================================================
    // Pull Request Comments
    // =============================================================================

    /// Comment on a pull request
    ///
    /// # Returns
    /// The web URL of the new comment
    pub async fn pr_comment_create(&self, report: &str, pr_number: u64) -> Result<String> {
        let (owner, repo) = self.repository("pr_comment_create")?;
        let url = self.endpoint(&format!(
            "/repos/{}/{}/issues/{}/comments",
            owner, repo, pr_number
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

    /// Replace the body of a pull request comment
    pub async fn pr_comment_update(&self, report: &str, comment_id: u64) -> Result<String> {
        let (owner, repo) = self.repository("pr_comment_update")?;
        let url = self.endpoint(&format!(
            "/repos/{}/{}/issues/comments/{}",
            owner, repo, comment_id
        ));
        let response = self
            .send(
                self.request(Method::PATCH, &url)
                    .json(&CommentBody { body: report }),
            )
            .await?;

        let comment: CommentPayload = self.handle_response(response).await?;
        Ok(comment.html_url)
    }

    /// List every comment on a pull request
    pub async fn pr_comments(&self, pr_number: u64) -> Result<Vec<Comment>> {
        let (owner, repo) = self.repository("pr_comments")?;
        let url = self.endpoint(&format!(
            "/repos/{}/{}/issues/{}/comments?per_page={}",
            owner, repo, pr_number, PER_PAGE
        ));

        let comments = self.paginate::<Vec<CommentPayload>>(url).await?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::client_for;
    use mockito::Matcher;
    use serde_json::json;

    fn pull(url: &str, head: &str, base: &str) -> serde_json::Value {
        pull_in(url, head, base, "open")
    }

    fn pull_in(url: &str, head: &str, base: &str, state: &str) -> serde_json::Value {
        json!({
            "html_url": url,
            "number": 1,
            "state": state,
            "head": {"ref": head},
            "base": {"ref": base}
        })
    }

    #[tokio::test]
    async fn test_pr_create() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/owner/repo/pulls")
            .match_body(Matcher::Json(json!({
                "head": "experiment",
                "base": "main",
                "title": "Results",
                "body": "Automated results"
            })))
            .with_status(201)
            .with_body(pull("https://github.com/owner/repo/pull/5", "experiment", "main").to_string())
            .create_async()
            .await;

        let url = client_for(&server)
            .pr_create(CreatePullRequest {
                source: "experiment".to_string(),
                target: "main".to_string(),
                title: "Results".to_string(),
                description: "Automated results".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(url, "https://github.com/owner/repo/pull/5");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_prs_maps_branches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/owner/repo/pulls")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "closed".into()),
                Matcher::UrlEncoded("per_page".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(json!([pull("u1", "refs/heads/feature", "main")]).to_string())
            .create_async()
            .await;

        let prs = client_for(&server).prs(PrState::Closed).await.unwrap();

        assert_eq!(
            prs,
            vec![PullRequest {
                url: "u1".to_string(),
                source: "feature".to_string(),
                target: "main".to_string(),
            }]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_commit_prs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/owner/repo/commits/abc/pulls")
            .with_status(200)
            .with_body(json!([pull("u1", "a", "b"), pull("u2", "c", "d")]).to_string())
            .create_async()
            .await;

        let prs = client_for(&server)
            .commit_prs("abc", PrState::default())
            .await
            .unwrap();

        assert_eq!(prs.len(), 2);
        assert_eq!(prs[1].source, "c");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_commit_prs_filters_by_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/owner/repo/commits/abc/pulls")
            .with_status(200)
            .with_body(
                json!([
                    pull_in("open-pr", "a", "main", "open"),
                    pull_in("closed-pr", "b", "main", "closed")
                ])
                .to_string(),
            )
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server);
        let urls = |prs: Vec<PullRequest>| prs.into_iter().map(|pr| pr.url).collect::<Vec<_>>();

        let open = client.commit_prs("abc", PrState::Open).await.unwrap();
        assert_eq!(urls(open), vec!["open-pr"]);
        let closed = client.commit_prs("abc", PrState::Closed).await.unwrap();
        assert_eq!(urls(closed), vec!["closed-pr"]);
        let all = client.commit_prs("abc", PrState::All).await.unwrap();
        assert_eq!(urls(all), vec!["open-pr", "closed-pr"]);
    }

    #[tokio::test]
    async fn test_pr_comment_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/repos/owner/repo/issues/5/comments")
            .match_body(Matcher::Json(json!({"body": "hello"})))
            .with_status(201)
            .with_body(json!({"id": 11, "body": "hello", "html_url": "c11"}).to_string())
            .create_async()
            .await;
        let update = server
            .mock("PATCH", "/repos/owner/repo/issues/comments/11")
            .with_status(200)
            .with_body(json!({"id": 11, "body": "bye", "html_url": "c11"}).to_string())
            .create_async()
            .await;
        let list = server
            .mock("GET", "/repos/owner/repo/issues/5/comments")
            .match_query(Matcher::Exact("per_page=100".to_string()))
            .with_status(200)
            .with_body(json!([{"id": 11, "body": "bye", "html_url": "c11"}]).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.pr_comment_create("hello", 5).await.unwrap(), "c11");
        assert_eq!(client.pr_comment_update("bye", 11).await.unwrap(), "c11");
        let comments = client.pr_comments(5).await.unwrap();
        assert_eq!(comments[0].body, "bye");

        create.assert_async().await;
        update.assert_async().await;
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_errors_propagate() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/owner/repo/pulls")
            .with_status(422)
            .with_body(r#"{"message":"Validation Failed"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .pr_create(CreatePullRequest {
                source: "a".to_string(),
                target: "a".to_string(),
                title: "t".to_string(),
                description: String::new(),
            })
            .await
            .unwrap_err();

        assert!(err.is_client_error());
    }
}
