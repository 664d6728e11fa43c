#[cfg(test)]
pub mod mock;
pub mod types;

pub use types::{Issue, PullRequestNode};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::util::{self, Repository};
use types::{GraphQlResponse, PullRequestQueryData, RepositoryInfo};

const USER_AGENT: &str = "pr-autopilot";

const PULL_REQUEST_QUERY: &str = r#"
query($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      number
      title
      body
      author { login }
      baseRefName
      headRefName
      headRefOid
      commits(first: 100) {
        totalCount
        nodes { commit { oid messageHeadline } }
      }
      files(first: 100) {
        nodes { path additions deletions changeType }
      }
    }
  }
}
"#;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),
}

/// The GitHub calls the pipeline depends on.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// `GET /repos/{owner}/{repo}/issues/{number}`
    async fn get_issue(&self, repo: &Repository, number: u64) -> Result<Issue, GitHubError>;

    /// `GET /repos/{owner}/{repo}`, returning `default_branch`
    async fn default_branch(&self, repo: &Repository) -> Result<String, GitHubError>;

    /// GraphQL `repository.pullRequest`. `Ok(None)` when the PR does not exist.
    async fn pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Option<PullRequestNode>, GitHubError>;
}

/// `GitHubApi` over reqwest with a bearer token.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Requests go out unauthenticated when `token` is None.
    pub fn new(api_url: &str, token: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: util::api_base_url(Some(api_url)),
            token: util::non_blank(token).map(str::to_string),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let url = format!("{}/{}", self.api_url, path.trim_start_matches('/'));
        debug!(%url, "GET");
        let request = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        let response = self.authorize(request).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GitHubError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Prefer the `message` field of a GitHub error body, else the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl GitHubApi for GitHubClient {
    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn get_issue(&self, repo: &Repository, number: u64) -> Result<Issue, GitHubError> {
        self.get_json(&format!("repos/{}/{}/issues/{}", repo.owner, repo.name, number))
            .await
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn default_branch(&self, repo: &Repository) -> Result<String, GitHubError> {
        let info: RepositoryInfo = self
            .get_json(&format!("repos/{}/{}", repo.owner, repo.name))
            .await?;
        Ok(info.default_branch)
    }

    #[instrument(skip(self, repo), fields(repo = %repo))]
    async fn pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Option<PullRequestNode>, GitHubError> {
        let url = util::graphql_url(&self.api_url);
        let body = json!({
            "query": PULL_REQUEST_QUERY,
            "variables": { "owner": repo.owner, "repo": repo.name, "number": number },
        });

        debug!(%url, "POST pull request query");
        let request = self
            .client
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .json(&body);
        let response = self.authorize(request).send().await?;
        let parsed: GraphQlResponse<PullRequestQueryData> = Self::decode(response).await?;
        pull_request_from_response(parsed)
    }
}

fn pull_request_from_response(
    response: GraphQlResponse<PullRequestQueryData>,
) -> Result<Option<PullRequestNode>, GitHubError> {
    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(GitHubError::GraphQl(messages.join("; ")));
    }
    Ok(response
        .data
        .and_then(|data| data.repository)
        .and_then(|repo| repo.pull_request))
}
