use crate::analysis::FieldGroup;
use crate::output::ReportFormat;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub backend: Backend,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_formats")]
    pub formats: Vec<ReportFormat>,
}

/// Which inference backend drives the analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Agent CLI when installed, otherwise chat completions when a key is set
    #[default]
    Auto,
    /// Multi-agent session through the `claude` CLI
    Agent,
    /// OpenAI-compatible chat completions
    Chat,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Auto => write!(f, "auto"),
            Backend::Agent => write!(f, "agent"),
            Backend::Chat => write!(f, "chat"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "agent" | "claude" | "claude_cli" => Ok(Backend::Agent),
            "chat" | "openai" | "legacy" => Ok(Backend::Chat),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AgentConfig {
    #[serde(default = "default_claude_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_claude_model")]
    pub model: String,

    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    #[serde(default = "default_permission_mode")]
    pub permission_mode: String,

    /// Overrides the per-role tool lists when set
    #[serde(default)]
    pub tools: Option<Vec<String>>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_agent_timeout_sec")]
    pub timeout_sec: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: default_claude_binary(),
            model: default_claude_model(),
            max_turns: default_max_turns(),
            permission_mode: default_permission_mode(),
            tools: None,
            api_key: None,
            timeout_sec: default_agent_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ChatConfig {
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_chat_timeout_sec")]
    pub timeout_sec: u64,

    /// Provider-specific fields merged into every request body
    #[serde(default)]
    pub extra_body: serde_json::Map<String, serde_json::Value>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            model: default_chat_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_sec: default_chat_timeout_sec(),
            extra_body: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GithubConfig {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    #[serde(default = "default_github_timeout_sec")]
    pub timeout_sec: u64,

    #[serde(default = "default_clone_timeout_sec")]
    pub clone_timeout_sec: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_github_api_base(),
            timeout_sec: default_github_timeout_sec(),
            clone_timeout_sec: default_clone_timeout_sec(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct StorageConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default = "default_storage_table")]
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: None,
            key: None,
            table: default_storage_table(),
        }
    }
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.key.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct AnalysisConfig {
    /// Deadline for the whole concurrent wave
    #[serde(default = "default_dispatch_timeout_sec")]
    pub dispatch_timeout_sec: u64,

    /// Upper bound on the context summary handed to every task
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    #[serde(default = "default_document_chars")]
    pub document_chars: usize,

    #[serde(default = "default_code_chars")]
    pub code_chars: usize,

    #[serde(default = "default_optional_groups")]
    pub optional_groups: Vec<FieldGroup>,

    #[serde(default = "default_true")]
    pub collect_code_samples: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_sec: default_dispatch_timeout_sec(),
            max_content_length: default_max_content_length(),
            document_chars: default_document_chars(),
            code_chars: default_code_chars(),
            optional_groups: default_optional_groups(),
            collect_code_samples: true,
        }
    }
}

/// External auditors run against the checkout; missing binaries are skipped
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SecurityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-tool deadline
    #[serde(default = "default_scan_timeout_sec")]
    pub timeout_sec: u64,

    #[serde(default = "default_pip_audit_binary")]
    pub pip_audit: PathBuf,

    #[serde(default = "default_safety_binary")]
    pub safety: PathBuf,

    #[serde(default = "default_uv_binary")]
    pub uv: PathBuf,

    #[serde(default = "default_bandit_binary")]
    pub bandit: PathBuf,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_sec: default_scan_timeout_sec(),
            pip_audit: default_pip_audit_binary(),
            safety: default_safety_binary(),
            uv: default_uv_binary(),
            bandit: default_bandit_binary(),
        }
    }
}
