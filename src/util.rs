use std::collections::HashMap;
use std::error::Error;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Public GitHub API endpoint used when no override is configured.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
#[error("Invalid repository '{0}': expected 'owner/repo'")]
pub struct RepositoryParseError(pub String);

/// Owner and name of a repository, parsed from an `owner/repo` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex is valid"))
}

/// Replace every `{{NAME}}` in `template` whose name is a key of `variables`.
///
/// The template is scanned once, so a substituted value is never scanned
/// again and `$`-sequences inside values are inserted verbatim. Unknown
/// placeholders are left as they are.
pub fn substitute_template(template: &str, variables: &HashMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Split an `owner/repo` string.
pub fn parse_repository(repository: &str) -> Result<Repository, RepositoryParseError> {
    let trimmed = repository.trim();
    match trimmed.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(Repository {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        }
        _ => Err(RepositoryParseError(repository.to_string())),
    }
}

/// REST API base URL without a trailing slash.
pub fn api_base_url(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .trim_end_matches('/')
        .to_string()
}

/// GraphQL endpoint for a REST API base.
///
/// GitHub Enterprise serves REST under `/api/v3` and GraphQL under `/api/graphql`.
pub fn graphql_url(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    match base.strip_suffix("/api/v3") {
        Some(host) => format!("{host}/api/graphql"),
        None => format!("{base}/graphql"),
    }
}

/// Flatten an error and its `source()` chain into one line.
pub fn error_message(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Treat unset, empty, and whitespace-only values alike.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
