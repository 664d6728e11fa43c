use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::util;

/// Settings file looked up in the current directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = ".pr-autopilot.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required value: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Optional on-disk settings. Every field may be omitted.
///
/// Flags and environment variables override anything set here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub github: GitHubSettings,

    #[serde(default)]
    pub branch: BranchSettings,

    #[serde(default)]
    pub git: GitSettings,

    #[serde(default)]
    pub plan: PlanSettings,

    #[serde(default)]
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubSettings {
    /// API token. If None, falls back to GITHUB_TOKEN.
    pub token: Option<String>,
    /// REST API base. If None, falls back to GITHUB_API_URL.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchSettings {
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitSettings {
    pub remote: Option<String>,
    pub bot_name: Option<String>,
    pub bot_email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanSettings {
    pub file: Option<PathBuf>,
    pub execution_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmSettings {
    pub claude_executable: Option<String>,
    pub codex_executable: Option<String>,
}

impl Settings {
    /// Load settings from `path`, or from `.pr-autopilot.toml` in the current
    /// directory. A missing default file yields `Settings::default()`; a
    /// missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Settings::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Flag/env value first, then the settings file.
    pub fn github_token(&self, from_env: Option<&str>) -> Option<String> {
        util::non_blank(from_env)
            .or_else(|| util::non_blank(self.github.token.as_deref()))
            .map(str::to_string)
    }

    pub fn api_url(&self, from_env: Option<&str>) -> String {
        let configured = util::non_blank(from_env).or(self.github.api_url.as_deref());
        util::api_base_url(configured)
    }
}

/// Unwrap a required string value, naming the variable when it is absent or blank.
pub fn required(name: &'static str, value: Option<&str>) -> Result<String, ConfigError> {
    util::non_blank(value)
        .map(str::to_string)
        .ok_or(ConfigError::Missing(name))
}

/// Parse a required positive PR number.
pub fn required_pr_number(name: &'static str, value: Option<&str>) -> Result<u64, ConfigError> {
    let raw = required(name, value)?;
    parse_pr_number(name, &raw)
}

pub fn parse_pr_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            name,
            reason: format!("'{raw}' is not a positive integer"),
        }),
    }
}

/// Interpret the usual truthy spellings of a boolean flag.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        util::non_blank(value).map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.github.token.is_none());
        assert!(settings.branch.prefix.is_none());
        assert!(settings.plan.file.is_none());
    }

    #[test]
    fn test_parse_settings_toml() {
        let toml_str = r#"
[github]
api_url = "https://ghe.example.com/api/v3"

[branch]
prefix = "bot/"

[git]
bot_name = "autopilot"

[plan]
file = "/var/tmp/plan.txt"

[llm]
claude_executable = "/opt/claude/bin/claude"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.branch.prefix.as_deref(), Some("bot/"));
        assert_eq!(settings.git.bot_name.as_deref(), Some("autopilot"));
        assert_eq!(settings.plan.file, Some(PathBuf::from("/var/tmp/plan.txt")));
        assert_eq!(
            settings.llm.claude_executable.as_deref(),
            Some("/opt/claude/bin/claude")
        );
        assert_eq!(settings.api_url(None), "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[github]\ntoken = \"from-file\"\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.github_token(None).as_deref(), Some("from-file"));
        assert_eq!(settings.github_token(Some("from-env")).as_deref(), Some("from-env"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[github\n").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_required_names_missing_variable() {
        let err = required("BRANCH_NAME", Some("  ")).unwrap_err();
        assert_eq!(err.to_string(), "Missing required value: BRANCH_NAME");
        assert_eq!(required("BRANCH_NAME", Some("main")).unwrap(), "main");
    }

    #[test]
    fn test_required_pr_number() {
        assert_eq!(required_pr_number("PR_NUMBER", Some("42")).unwrap(), 42);
        assert!(matches!(
            required_pr_number("PR_NUMBER", Some("0")),
            Err(ConfigError::Invalid { name: "PR_NUMBER", .. })
        ));
        assert!(matches!(
            required_pr_number("PR_NUMBER", Some("abc")),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            required_pr_number("PR_NUMBER", None),
            Err(ConfigError::Missing("PR_NUMBER"))
        ));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("TRUE")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }
}
