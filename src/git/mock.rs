use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Git, GitError};

/// Test `Git` that records calls and fails the methods named in `failing`.
pub struct MockGit {
    pub failing: Mutex<HashSet<&'static str>>,
    pub status_output: Mutex<String>,
    pub diff_output: Mutex<String>,
    /// Call log: (method, argument summary)
    pub calls: Mutex<Vec<(String, String)>>,
}

impl Default for MockGit {
    fn default() -> Self {
        Self {
            failing: Mutex::new(HashSet::new()),
            status_output: Mutex::new(String::new()),
            diff_output: Mutex::new(String::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub fn set_status(&self, status: &str) {
        *self.status_output.lock().unwrap() = status.to_string();
    }

    pub fn set_diff(&self, diff: &str) {
        *self.diff_output.lock().unwrap() = diff.to_string();
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|(m, _)| m == method)
    }

    pub fn calls_to(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, args)| args.clone())
            .collect()
    }

    fn record(&self, method: &'static str, args: String) -> Result<(), GitError> {
        self.calls.lock().unwrap().push((method.to_string(), args.clone()));
        if self.failing.lock().unwrap().contains(method) {
            return Err(GitError::Failed {
                command: format!("{method} {args}"),
                stderr: format!("mock: {method} failed"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Git for MockGit {
    async fn fetch(&self, remote: &str, refspec: &str) -> Result<(), GitError> {
        self.record("fetch", format!("{remote} {refspec}"))
    }

    async fn diff(&self, from: &str, to: &str) -> Result<String, GitError> {
        self.record("diff", format!("{from} {to}"))?;
        Ok(self.diff_output.lock().unwrap().clone())
    }

    async fn checkout_new_branch(
        &self,
        branch: &str,
        start_point: Option<&str>,
    ) -> Result<(), GitError> {
        let args = match start_point {
            Some(start) => format!("{branch} {start}"),
            None => branch.to_string(),
        };
        // Fallback checkouts (no start point) are scripted separately.
        let method = if start_point.is_some() {
            "checkout_new_branch"
        } else {
            "checkout_new_branch_here"
        };
        self.record(method, args)
    }

    async fn status_porcelain(&self) -> Result<String, GitError> {
        self.record("status_porcelain", String::new())?;
        Ok(self.status_output.lock().unwrap().clone())
    }

    async fn set_identity(&self, name: &str, email: &str) -> Result<(), GitError> {
        self.record("set_identity", format!("{name} <{email}>"))
    }

    async fn add_all(&self) -> Result<(), GitError> {
        self.record("add_all", String::new())
    }

    async fn commit(&self, message: &str) -> Result<(), GitError> {
        self.record("commit", message.to_string())
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.record("push", format!("{remote} {branch}"))
    }
}
