#[cfg(test)]
pub mod mock;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("`git {command}` failed: {stderr}")]
    Failed { command: String, stderr: String },
}

/// Git operations the pipeline performs on the working tree.
#[async_trait]
pub trait Git: Send + Sync {
    /// `git fetch {remote} {refspec}`
    async fn fetch(&self, remote: &str, refspec: &str) -> Result<(), GitError>;

    /// `git diff {from} {to}`, returning the unified diff text
    async fn diff(&self, from: &str, to: &str) -> Result<String, GitError>;

    /// `git checkout -b {branch} [start_point]`
    async fn checkout_new_branch(
        &self,
        branch: &str,
        start_point: Option<&str>,
    ) -> Result<(), GitError>;

    /// `git status --porcelain`
    async fn status_porcelain(&self) -> Result<String, GitError>;

    /// `git config user.name` / `git config user.email`
    async fn set_identity(&self, name: &str, email: &str) -> Result<(), GitError>;

    /// `git add -A`
    async fn add_all(&self) -> Result<(), GitError>;

    /// `git commit -m {message}`
    async fn commit(&self, message: &str) -> Result<(), GitError>;

    /// `git push -u {remote} {branch}`
    async fn push(&self, remote: &str, branch: &str) -> Result<(), GitError>;
}

/// Shells out to the `git` binary inside `workdir`.
pub struct RealGit {
    workdir: PathBuf,
}

impl RealGit {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let command = args.join(" ");
        debug!(%command, "running git");
        let output = tokio::process::Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(GitError::Failed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Git for RealGit {
    async fn fetch(&self, remote: &str, refspec: &str) -> Result<(), GitError> {
        self.run(&["fetch", remote, refspec]).await.map(|_| ())
    }

    async fn diff(&self, from: &str, to: &str) -> Result<String, GitError> {
        self.run(&["diff", from, to]).await
    }

    async fn checkout_new_branch(
        &self,
        branch: &str,
        start_point: Option<&str>,
    ) -> Result<(), GitError> {
        let mut args = vec!["checkout", "-b", branch];
        if let Some(start) = start_point {
            args.push(start);
        }
        self.run(&args).await.map(|_| ())
    }

    async fn status_porcelain(&self) -> Result<String, GitError> {
        self.run(&["status", "--porcelain"]).await
    }

    async fn set_identity(&self, name: &str, email: &str) -> Result<(), GitError> {
        self.run(&["config", "user.name", name]).await?;
        self.run(&["config", "user.email", email]).await?;
        Ok(())
    }

    async fn add_all(&self) -> Result<(), GitError> {
        self.run(&["add", "-A"]).await.map(|_| ())
    }

    async fn commit(&self, message: &str) -> Result<(), GitError> {
        self.run(&["commit", "-m", message]).await.map(|_| ())
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(&["push", "-u", remote, branch]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    async fn init_repo(dir: &Path) -> RealGit {
        let git = RealGit::new(dir);
        git.run(&["init", "-q"]).await.unwrap();
        git.set_identity("Test", "test@example.com").await.unwrap();
        git
    }

    #[tokio::test]
    async fn test_status_porcelain_reports_untracked_file() {
        let dir = tempfile::tempdir().unwrap();
        let git = init_repo(dir.path()).await;
        assert!(git.status_porcelain().await.unwrap().trim().is_empty());

        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let status = git.status_porcelain().await.unwrap();
        assert!(status.contains("notes.txt"));
    }

    #[tokio::test]
    async fn test_failed_command_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let git = init_repo(dir.path()).await;
        let err = git.diff("origin/does-not-exist", "HEAD").await.unwrap_err();
        match err {
            GitError::Failed { command, .. } => assert_eq!(command, "diff origin/does-not-exist HEAD"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
