use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::PrError;
use crate::config::ConfigError;
use crate::github::GitHubApi;
use crate::util::{self, Repository};

/// What the triggering event says about the PR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventContext {
    /// e.g. "pull_request", "issue_comment"
    pub event_name: Option<String>,
    /// `pull_request.number` of a pull request event
    pub pr_number: Option<u64>,
    /// `issue.number` of an issue comment event
    pub issue_number: Option<u64>,
}

impl EventContext {
    /// Pull numbers out of a webhook payload.
    pub fn from_payload(event_name: Option<&str>, payload: &Value) -> Self {
        let number_at = |pointer: &str| payload.pointer(pointer).and_then(Value::as_u64);
        Self {
            event_name: util::non_blank(event_name).map(str::to_string),
            pr_number: number_at("/pull_request/number"),
            issue_number: number_at("/issue/number"),
        }
    }

    /// Build the context from explicit event values, falling back to the
    /// payload file at `event_path`. An unreadable payload is ignored.
    pub fn load(
        event_name: Option<&str>,
        event_path: Option<&Path>,
        pr_number: Option<&str>,
        issue_number: Option<&str>,
    ) -> Self {
        let mut context = match event_path {
            Some(path) => match read_payload(path) {
                Ok(payload) => Self::from_payload(event_name, &payload),
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "ignoring unreadable event payload");
                    Self::from_payload(event_name, &Value::Null)
                }
            },
            None => Self::from_payload(event_name, &Value::Null),
        };

        if let Some(n) = parse_number(pr_number) {
            context.pr_number = Some(n);
        }
        if let Some(n) = parse_number(issue_number) {
            context.issue_number = Some(n);
        }
        context
    }
}

fn read_payload(path: &Path) -> Result<Value, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&contents).map_err(|e| e.to_string())
}

fn parse_number(value: Option<&str>) -> Option<u64> {
    util::non_blank(value)?.parse().ok().filter(|n| *n > 0)
}

/// Inputs to PR-number resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveConfig {
    /// Explicitly requested PR number (PR_NUMBER)
    pub explicit: Option<String>,
    /// Needed only for the issue-comment lookup (REPOSITORY)
    pub repository: Option<Repository>,
    pub event: EventContext,
}

/// Resolve the PR a run operates on.
///
/// Precedence: explicit number, pull request event, issue comment event
/// (one issue lookup). A failed lookup is logged and falls through to the
/// final "no PR number" error.
#[instrument(skip_all, fields(event = ?config.event.event_name))]
pub async fn resolve_pr_number(
    config: &ResolveConfig,
    github: &dyn GitHubApi,
) -> Result<u64, PrError> {
    if let Some(raw) = util::non_blank(config.explicit.as_deref()) {
        match raw.parse::<u64>() {
            Ok(n) if n > 0 => {
                info!(pr = n, "using explicit PR number");
                return Ok(n);
            }
            _ => warn!(value = raw, "ignoring explicit PR number that is not a positive integer"),
        }
    }

    if let Some(n) = config.event.pr_number {
        info!(pr = n, "using PR number from pull request event");
        return Ok(n);
    }

    if let Some(issue_number) = config.event.issue_number {
        let repository = config
            .repository
            .as_ref()
            .ok_or(ConfigError::Missing("REPOSITORY"))?;

        debug!(issue = issue_number, "looking up issue from comment event");
        match github.get_issue(repository, issue_number).await {
            Ok(issue) => {
                if issue.pull_request.is_none() {
                    return Err(PrError::NotAPullRequest(issue_number));
                }
                if let Some(n) = issue.linked_pr_number() {
                    info!(pr = n, "resolved PR number from issue comment event");
                    return Ok(n);
                }
                warn!(issue = issue_number, "pull request link has no trailing PR number");
            }
            Err(err) => {
                warn!(issue = issue_number, error = %err, "issue lookup failed");
            }
        }
    }

    Err(PrError::NoPrNumber {
        event: config
            .event
            .event_name
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
    })
}
