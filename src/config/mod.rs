mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::{Path, PathBuf};

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            backend: Backend::default(),
            agent: AgentConfig::default(),
            chat: ChatConfig::default(),
            github: GithubConfig::default(),
            storage: StorageConfig::default(),
            analysis: AnalysisConfig::default(),
            security: SecurityConfig::default(),
            tmp_dir: default_tmp_dir(),
            output_dir: default_output_dir(),
            formats: default_formats(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load the YAML file when present, then layer `.env` and process
    /// environment variables on top
    pub fn resolve(path: &Path, env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(file) => {
                dotenv::from_path(file).map_err(|e| ConfigError::EnvFile {
                    path: file.to_path_buf(),
                    reason: e.to_string(),
                })?;
            }
            None => {
                dotenv::dotenv().ok();
            }
        }

        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override settings from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("CLAUDE_API_KEY") {
            self.agent.api_key = Some(key);
        }
        if let Some(model) = get("CLAUDE_MODEL") {
            self.agent.model = model;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.chat.api_key = Some(key);
        }
        if let Some(base_url) = get("OPENAI_BASE_URL") {
            self.chat.base_url = base_url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.chat.model = model;
        }
        if let Some(token) = get("HUB_TOKEN").or_else(|| get("GITHUB_TOKEN")) {
            self.github.token = Some(token);
        }
        if let Some(url) = get("SUPABASE_URL") {
            self.storage.url = Some(url);
        }
        if let Some(key) = get("SUPABASE_SERVICE_ROLE_KEY") {
            self.storage.key = Some(key);
        }
        if let Some(dir) = get("TMP_DIR") {
            self.tmp_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(len) = get("MAX_CONTENT_LENGTH") {
            match len.trim().parse() {
                Ok(n) => self.analysis.max_content_length = n,
                Err(_) => tracing::warn!("Ignoring non-numeric MAX_CONTENT_LENGTH: {}", len),
            }
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.max_content_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.max_content_length",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.analysis.dispatch_timeout_sec == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.dispatch_timeout_sec",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.security.enabled && self.security.timeout_sec == 0 {
            return Err(ConfigError::InvalidValue {
                field: "security.timeout_sec",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.agent.max_turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_turns",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.formats.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "formats",
                reason: "at least one report format is required".to_string(),
            });
        }
        Ok(())
    }

    /// Non-fatal problems worth surfacing to the user
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        match self.backend {
            Backend::Chat if self.chat.api_key.is_none() => {
                issues.push("chat backend selected but OPENAI_API_KEY is not set".to_string());
            }
            Backend::Auto if self.chat.api_key.is_none() => {
                issues.push(
                    "OPENAI_API_KEY is not set; only the agent CLI backend can be used"
                        .to_string(),
                );
            }
            _ => {}
        }
        if self.github.token.is_none() {
            issues.push("HUB_TOKEN is not set; GitHub API calls are rate limited".to_string());
        }
        if !self.storage.is_configured() {
            issues.push(
                "SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY not set; results will not be saved"
                    .to_string(),
            );
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FieldGroup;
    use std::collections::HashMap;

    #[test]
    fn test_yaml_defaults_fill_missing_sections() {
        let yaml = r#"
backend: chat
chat:
  model: qwen-plus
analysis:
  optional_groups: [performance, testing]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend, Backend::Chat);
        assert_eq!(config.chat.model, "qwen-plus");
        assert_eq!(config.chat.base_url, "https://api.openai.com/v1");
        assert_eq!(
            config.analysis.optional_groups,
            vec![FieldGroup::Performance, FieldGroup::Testing]
        );
        assert_eq!(config.analysis.max_content_length, 10_000);
        assert_eq!(config.storage.table, "bio_analysis_results");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "deepseek-chat"),
            ("GITHUB_TOKEN", "ghp_x"),
            ("SUPABASE_URL", "https://db.example.com"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("OUTPUT_DIR", "out"),
            ("MAX_CONTENT_LENGTH", "2048"),
            ("CLAUDE_MODEL", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.chat.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.chat.model, "deepseek-chat");
        assert_eq!(config.github.token.as_deref(), Some("ghp_x"));
        assert!(config.storage.is_configured());
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.analysis.max_content_length, 2048);
        // Blank values do not clobber defaults
        assert_eq!(config.agent.model, "sonnet");
    }

    #[test]
    fn test_hub_token_wins_over_github_token() {
        let mut config = Config::default();
        config.apply_env(|k| match k {
            "HUB_TOKEN" => Some("hub".to_string()),
            "GITHUB_TOKEN" => Some("gh".to_string()),
            _ => None,
        });
        assert_eq!(config.github.token.as_deref(), Some("hub"));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.analysis.max_content_length = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "analysis.max_content_length",
                ..
            })
        ));
    }

    #[test]
    fn test_security_section() {
        let config: Config = serde_yaml::from_str("security:\n  bandit: /opt/bandit\n").unwrap();
        assert!(config.security.enabled);
        assert_eq!(config.security.timeout_sec, 120);
        assert_eq!(config.security.bandit, PathBuf::from("/opt/bandit"));
        assert_eq!(config.security.pip_audit, PathBuf::from("pip-audit"));

        let mut config = Config::default();
        config.security.timeout_sec = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "security.timeout_sec",
                ..
            })
        ));
        config.security.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_issues_report_missing_credentials() {
        let config = Config::default();
        let issues = config.issues();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().any(|i| i.contains("HUB_TOKEN")));
    }

    #[test]
    fn test_backend_from_str_aliases() {
        assert_eq!("claude".parse::<Backend>().unwrap(), Backend::Agent);
        assert_eq!("LEGACY".parse::<Backend>().unwrap(), Backend::Chat);
        assert!("codex".parse::<Backend>().is_err());
    }
}
