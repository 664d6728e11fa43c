use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{Actor, CommitInfo, CommitNode, Connection, FileNode};
use super::{GitHubApi, GitHubError, Issue, PullRequestNode};
use crate::util::Repository;

/// In-memory `GitHubApi` that records every call.
pub struct MockGitHub {
    pub issues: Mutex<HashMap<u64, Issue>>,
    /// When set, `get_issue` fails as if the network were down.
    pub issue_lookup_fails: Mutex<bool>,
    pub default_branch: Mutex<String>,
    pub pull_request: Mutex<Option<PullRequestNode>>,
    /// Call log: (method, argument summary)
    pub calls: Mutex<Vec<(String, String)>>,
}

impl Default for MockGitHub {
    fn default() -> Self {
        Self {
            issues: Mutex::new(HashMap::new()),
            issue_lookup_fails: Mutex::new(false),
            default_branch: Mutex::new("main".to_string()),
            pull_request: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pull_request(node: PullRequestNode) -> Self {
        let mock = Self::default();
        *mock.pull_request.lock().unwrap() = Some(node);
        mock
    }

    pub fn add_issue(&self, number: u64, pr_url: Option<&str>) {
        let issue: Issue = serde_json::from_value(serde_json::json!({
            "number": number,
            "title": format!("Issue {number}"),
            "pull_request": pr_url.map(|url| serde_json::json!({ "url": url })),
        }))
        .unwrap();
        self.issues.lock().unwrap().insert(number, issue);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|(m, _)| m == method)
    }
}

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn get_issue(&self, repo: &Repository, number: u64) -> Result<Issue, GitHubError> {
        self.calls
            .lock()
            .unwrap()
            .push(("get_issue".into(), format!("{repo}#{number}")));

        if *self.issue_lookup_fails.lock().unwrap() {
            return Err(GitHubError::Api {
                status: 502,
                message: "mock: bad gateway".into(),
            });
        }

        self.issues
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or(GitHubError::Api {
                status: 404,
                message: "Not Found".into(),
            })
    }

    async fn default_branch(&self, repo: &Repository) -> Result<String, GitHubError> {
        self.calls
            .lock()
            .unwrap()
            .push(("default_branch".into(), repo.to_string()));
        Ok(self.default_branch.lock().unwrap().clone())
    }

    async fn pull_request(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<Option<PullRequestNode>, GitHubError> {
        self.calls
            .lock()
            .unwrap()
            .push(("pull_request".into(), format!("{repo}#{number}")));
        Ok(self.pull_request.lock().unwrap().clone())
    }
}

/// A realistic PR node for tests.
pub fn sample_pull_request() -> PullRequestNode {
    PullRequestNode {
        number: 42,
        title: "Add OAuth2 login flow".to_string(),
        body: Some("Implements the login flow.\nCloses #12".to_string()),
        author: Some(Actor {
            login: "alice".to_string(),
        }),
        base_ref_name: "main".to_string(),
        head_ref_name: "feature/oauth".to_string(),
        head_ref_oid: "0f1e2d3c".to_string(),
        commits: Some(Connection {
            total_count: Some(1),
            nodes: vec![CommitNode {
                commit: CommitInfo {
                    oid: "0f1e2d3c".to_string(),
                    message_headline: "Add login handler".to_string(),
                },
            }],
        }),
        files: Some(Connection {
            total_count: None,
            nodes: vec![
                FileNode {
                    path: "src/auth/login.rs".to_string(),
                    additions: 120,
                    deletions: 4,
                    change_type: "ADDED".to_string(),
                },
                FileNode {
                    path: "src/main.rs".to_string(),
                    additions: 3,
                    deletions: 1,
                    change_type: "MODIFIED".to_string(),
                },
            ],
        }),
    }
}
