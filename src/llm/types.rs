use std::path::PathBuf;
use std::str::FromStr;

use serde_json::Value;

/// AI CLI selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Codex,
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(Provider::Claude),
            "codex" => Ok(Provider::Codex),
            other => Err(format!("Unknown provider: '{other}' (expected 'claude' or 'codex')")),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Claude => write!(f, "claude"),
            Provider::Codex => write!(f, "codex"),
        }
    }
}

/// Everything one LLM invocation needs. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RunLlmConfig {
    /// Raw provider name; unknown names fail at dispatch time
    pub provider: String,
    pub prompt: String,
    /// true: capture stdout (planning). false: inherit stdio and let the CLI edit files.
    pub capture_output: bool,
    pub model: Option<String>,
    /// Claude `--permission-mode`
    pub permission_mode: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub claude_oauth_token: Option<String>,
    pub use_bedrock: bool,
    pub use_vertex: bool,
    /// Extra Claude arguments, JSON array or whitespace separated
    pub claude_args: Option<String>,
    pub openai_api_key: Option<String>,
    /// Extra Codex arguments, JSON array or whitespace separated
    pub codex_args: Option<String>,
    /// Codex `--sandbox` mode
    pub codex_sandbox: Option<String>,
    pub claude_executable: String,
    pub codex_executable: String,
    /// Where the Codex prompt is written before `codex exec` runs
    pub codex_prompt_file: PathBuf,
}

impl Default for RunLlmConfig {
    fn default() -> Self {
        Self {
            provider: "claude".to_string(),
            prompt: String::new(),
            capture_output: false,
            model: None,
            permission_mode: None,
            anthropic_api_key: None,
            claude_oauth_token: None,
            use_bedrock: false,
            use_vertex: false,
            claude_args: None,
            openai_api_key: None,
            codex_args: None,
            codex_sandbox: None,
            claude_executable: "claude".to_string(),
            codex_executable: "codex".to_string(),
            codex_prompt_file: std::env::temp_dir().join("codex-prompt.txt"),
        }
    }
}

/// Uniform outcome of an LLM run. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResult {
    pub success: bool,
    /// Trimmed stdout in capture mode
    pub output: Option<String>,
    pub error: Option<String>,
}

impl LlmResult {
    pub fn succeeded(output: Option<String>) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Caller-supplied CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraArgs {
    /// Parsed from a JSON array
    Structured(Vec<String>),
    /// Split on whitespace
    Raw(Vec<String>),
}

impl ExtraArgs {
    /// JSON array first, whitespace split otherwise.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with('[') {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                return ExtraArgs::Structured(
                    items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .collect(),
                );
            }
        }
        ExtraArgs::Raw(trimmed.split_whitespace().map(str::to_string).collect())
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            ExtraArgs::Structured(args) | ExtraArgs::Raw(args) => args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("claude".parse::<Provider>().unwrap(), Provider::Claude);
        assert_eq!(" Codex ".parse::<Provider>().unwrap(), Provider::Codex);
        let err = "gemini".parse::<Provider>().unwrap_err();
        assert!(err.contains("Unknown provider"));
    }

    #[test]
    fn test_extra_args_json_array() {
        let args = ExtraArgs::parse(r#"["--max-turns", "5", "--append-system-prompt", "be brief"]"#);
        assert_eq!(
            args,
            ExtraArgs::Structured(vec![
                "--max-turns".into(),
                "5".into(),
                "--append-system-prompt".into(),
                "be brief".into(),
            ])
        );
    }

    #[test]
    fn test_extra_args_json_non_string_items() {
        let args = ExtraArgs::parse(r#"["--max-turns", 5]"#);
        assert_eq!(args.into_vec(), vec!["--max-turns", "5"]);
    }

    #[test]
    fn test_extra_args_whitespace_fallback() {
        assert_eq!(
            ExtraArgs::parse("--full-auto  -c model=o3"),
            ExtraArgs::Raw(vec!["--full-auto".into(), "-c".into(), "model=o3".into()])
        );
        assert_eq!(
            ExtraArgs::parse("[not json"),
            ExtraArgs::Raw(vec!["[not".into(), "json".into()])
        );
        assert_eq!(ExtraArgs::parse("   "), ExtraArgs::Raw(vec![]));
    }

    #[test]
    fn test_llm_result_constructors() {
        let ok = LlmResult::succeeded(Some("plan".into()));
        assert!(ok.success);
        assert_eq!(ok.output.as_deref(), Some("plan"));

        let failed = LlmResult::failed("boom");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
