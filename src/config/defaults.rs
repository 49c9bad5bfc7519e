use crate::analysis::FieldGroup;
use crate::output::ReportFormat;
use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_tmp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

pub fn default_output_dir() -> PathBuf {
    PathBuf::from("docs")
}

pub fn default_formats() -> Vec<ReportFormat> {
    vec![ReportFormat::Html, ReportFormat::Markdown, ReportFormat::Json]
}

pub fn default_claude_binary() -> PathBuf {
    // Check common install location first
    if let Some(home) = std::env::var_os("HOME") {
        let local_path = PathBuf::from(home).join(".claude/local/claude");
        if local_path.exists() {
            return local_path;
        }
    }
    // Fall back to PATH lookup
    PathBuf::from("claude")
}

pub fn default_claude_model() -> String {
    "sonnet".to_string()
}

pub fn default_max_turns() -> u32 {
    10
}

pub fn default_permission_mode() -> String {
    "acceptEdits".to_string()
}

pub fn default_agent_timeout_sec() -> u64 {
    600
}

pub fn default_chat_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

pub fn default_max_tokens() -> u32 {
    3000
}

pub fn default_temperature() -> f32 {
    0.1
}

pub fn default_chat_timeout_sec() -> u64 {
    60
}

pub fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

pub fn default_github_timeout_sec() -> u64 {
    10
}

pub fn default_clone_timeout_sec() -> u64 {
    300
}

pub fn default_storage_table() -> String {
    "bio_analysis_results".to_string()
}

pub fn default_dispatch_timeout_sec() -> u64 {
    900
}

pub fn default_max_content_length() -> usize {
    10_000
}

pub fn default_document_chars() -> usize {
    6_000
}

pub fn default_code_chars() -> usize {
    4_000
}

pub fn default_scan_timeout_sec() -> u64 {
    120
}

pub fn default_pip_audit_binary() -> PathBuf {
    PathBuf::from("pip-audit")
}

pub fn default_safety_binary() -> PathBuf {
    PathBuf::from("safety")
}

pub fn default_uv_binary() -> PathBuf {
    PathBuf::from("uv")
}

pub fn default_bandit_binary() -> PathBuf {
    PathBuf::from("bandit")
}

pub fn default_optional_groups() -> Vec<FieldGroup> {
    FieldGroup::OPTIONAL.to_vec()
}

pub fn default_true() -> bool {
    true
}
