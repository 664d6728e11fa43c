use serde::Deserialize;

/// Subset of the REST issue object used to tell issues from pull requests.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    /// Present only when the issue is a pull request.
    pub pull_request: Option<IssuePullRequestLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePullRequestLink {
    pub url: Option<String>,
}

impl Issue {
    /// PR number taken from the trailing segment of the `pull_request.url`.
    pub fn linked_pr_number(&self) -> Option<u64> {
        let url = self.pull_request.as_ref()?.url.as_deref()?;
        url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepositoryInfo {
    pub default_branch: String,
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullRequestQueryData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryNode {
    pub pull_request: Option<PullRequestNode>,
}

/// Pull request fields returned by the GraphQL query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    /// None when the author account was deleted.
    pub author: Option<Actor>,
    pub base_ref_name: String,
    pub head_ref_name: String,
    pub head_ref_oid: String,
    pub commits: Option<Connection<CommitNode>>,
    pub files: Option<Connection<FileNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitNode {
    pub commit: CommitInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub oid: String,
    #[serde(default)]
    pub message_headline: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub path: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub change_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_linked_pr_number() {
        let issue: Issue = serde_json::from_str(
            r#"{"number": 7, "title": "t", "pull_request": {"url": "https://api.github.com/repos/o/r/pulls/7"}}"#,
        )
        .unwrap();
        assert_eq!(issue.linked_pr_number(), Some(7));
    }

    #[test]
    fn test_plain_issue_has_no_pr_number() {
        let issue: Issue = serde_json::from_str(r#"{"number": 7, "title": "t"}"#).unwrap();
        assert!(issue.pull_request.is_none());
        assert_eq!(issue.linked_pr_number(), None);
    }

    #[test]
    fn test_deserialize_pull_request_node() {
        let json = r#"{
            "number": 42,
            "title": "Add OAuth2 login flow",
            "body": null,
            "author": null,
            "baseRefName": "main",
            "headRefName": "feature/oauth",
            "headRefOid": "abc123",
            "commits": {"totalCount": 1, "nodes": [{"commit": {"oid": "abc123", "messageHeadline": "wip"}}]},
            "files": {"nodes": [{"path": "src/auth.rs", "additions": 10, "deletions": 2, "changeType": "MODIFIED"}]}
        }"#;
        let node: PullRequestNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.number, 42);
        assert!(node.author.is_none());
        assert_eq!(node.head_ref_oid, "abc123");
        assert_eq!(node.commits.unwrap().total_count, Some(1));
        assert_eq!(node.files.unwrap().nodes[0].change_type, "MODIFIED");
    }

    #[test]
    fn test_graphql_errors_envelope() {
        let resp: GraphQlResponse<PullRequestQueryData> = serde_json::from_str(
            r#"{"data": null, "errors": [{"message": "Bad credentials"}]}"#,
        )
        .unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors[0].message, "Bad credentials");
    }
}
