use tracing::{info, instrument};

use super::types::{ExtraArgs, LlmResult, RunLlmConfig};
use super::{cli_available, execute};
use crate::util;

/// Tools the Claude CLI may use without asking.
pub const ALLOWED_TOOLS: &str = "Bash,Read,Write,Edit,Glob,Grep";

#[instrument(skip_all, fields(capture = config.capture_output))]
pub async fn run(config: &RunLlmConfig) -> LlmResult {
    if !cli_available(&config.claude_executable) {
        return LlmResult::failed(format!(
            "Claude CLI '{}' not found. Install it with: npm install -g @anthropic-ai/claude-code",
            config.claude_executable
        ));
    }

    if util::non_blank(config.anthropic_api_key.as_deref()).is_none()
        && util::non_blank(config.claude_oauth_token.as_deref()).is_none()
    {
        return LlmResult::failed(
            "Either ANTHROPIC_API_KEY or CLAUDE_CODE_OAUTH_TOKEN is required for the claude provider",
        );
    }

    let args = build_args(config);
    let envs = build_env(config);
    info!(arg_count = args.len(), "running claude");

    match execute(&config.claude_executable, &args, &envs, config.capture_output).await {
        Ok(output) => LlmResult::succeeded(output),
        Err(error) => LlmResult::failed(error),
    }
}

/// `-p <prompt> [--model M] [--permission-mode P] --allowedTools ... --no-session-persistence [extra...]`
pub fn build_args(config: &RunLlmConfig) -> Vec<String> {
    let mut args = vec!["-p".to_string(), config.prompt.clone()];

    if let Some(model) = util::non_blank(config.model.as_deref()) {
        args.extend(["--model".to_string(), model.to_string()]);
    }
    if let Some(mode) = util::non_blank(config.permission_mode.as_deref()) {
        args.extend(["--permission-mode".to_string(), mode.to_string()]);
    }
    args.extend(["--allowedTools".to_string(), ALLOWED_TOOLS.to_string()]);
    args.push("--no-session-persistence".to_string());

    if let Some(extra) = util::non_blank(config.claude_args.as_deref()) {
        args.extend(ExtraArgs::parse(extra).into_vec());
    }
    args
}

/// Credentials plus the cloud backend toggles that were asked for.
pub fn build_env(config: &RunLlmConfig) -> Vec<(String, String)> {
    let mut envs = Vec::new();
    if let Some(key) = util::non_blank(config.anthropic_api_key.as_deref()) {
        envs.push(("ANTHROPIC_API_KEY".to_string(), key.to_string()));
    }
    if let Some(token) = util::non_blank(config.claude_oauth_token.as_deref()) {
        envs.push(("CLAUDE_CODE_OAUTH_TOKEN".to_string(), token.to_string()));
    }
    if config.use_bedrock {
        envs.push(("CLAUDE_CODE_USE_BEDROCK".to_string(), "1".to_string()));
    }
    if config.use_vertex {
        envs.push(("CLAUDE_CODE_USE_VERTEX".to_string(), "1".to_string()));
    }
    envs
}
