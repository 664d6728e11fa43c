pub mod claude;
pub mod codex;
pub mod types;

pub use types::{ExtraArgs, LlmResult, Provider, RunLlmConfig};

use std::process::Stdio;

use async_trait::async_trait;
use tracing::{debug, warn};

/// Seam between the pipeline and the provider CLIs.
#[async_trait]
pub trait LlmRunner: Send + Sync {
    async fn run(&self, config: &RunLlmConfig) -> LlmResult;
}

/// Runs the real `claude` / `codex` executables.
pub struct CliRunner;

#[async_trait]
impl LlmRunner for CliRunner {
    async fn run(&self, config: &RunLlmConfig) -> LlmResult {
        run_llm(config).await
    }
}

/// Run the configured provider. Every failure comes back as
/// `LlmResult { success: false, .. }`.
pub async fn run_llm(config: &RunLlmConfig) -> LlmResult {
    let result = match config.provider.parse::<Provider>() {
        Ok(Provider::Claude) => claude::run(config).await,
        Ok(Provider::Codex) => codex::run(config).await,
        Err(error) => LlmResult::failed(error),
    };
    if let Some(error) = &result.error {
        warn!(provider = %config.provider, %error, "LLM run failed");
    }
    result
}

pub(crate) fn cli_available(executable: &str) -> bool {
    which::which(executable).is_ok()
}

/// Run `program`. In capture mode returns trimmed stdout; otherwise the
/// child shares our stdio and `Ok(None)` is returned.
pub(crate) async fn execute(
    program: &str,
    args: &[String],
    envs: &[(String, String)],
    capture: bool,
) -> Result<Option<String>, String> {
    let mut command = tokio::process::Command::new(program);
    command.args(args).envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    debug!(%program, capture, "spawning");

    if capture {
        let output = command
            .output()
            .await
            .map_err(|e| format!("Failed to run {program}: {e}"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("{program} exited with {}: {}", output.status, stderr.trim()));
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    } else {
        let status = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| format!("Failed to run {program}: {e}"))?;
        if !status.success() {
            return Err(format!("{program} exited with {status}"));
        }
        Ok(None)
    }
}

/// Executable shell script standing in for a provider CLI.
#[cfg(all(test, unix))]
pub(crate) fn stub_cli(dir: &std::path::Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}
