use super::types::{AuthorInfo, ProjectArchitecture, RepositoryInfo};
use crate::config::AnalysisConfig;
use std::fmt::Write;

/// Everything known about the repository before inference starts
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub repository: RepositoryInfo,
    pub authors: Vec<AuthorInfo>,
    pub document: Option<String>,
    pub code_samples: Option<String>,
    pub architecture: Option<ProjectArchitecture>,
    /// Findings from the external security auditors
    pub scan_findings: Vec<String>,
}

/// Character ceilings applied when the context is rendered into a prompt
#[derive(Debug, Clone, Copy)]
pub struct ContextLimits {
    pub max_content_length: usize,
    pub document_chars: usize,
    pub code_chars: usize,
}

impl From<&AnalysisConfig> for ContextLimits {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            max_content_length: config.max_content_length,
            document_chars: config.document_chars,
            code_chars: config.code_chars,
        }
    }
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl AnalysisContext {
    pub fn new(repository: RepositoryInfo) -> Self {
        Self {
            repository,
            authors: Vec::new(),
            document: None,
            code_samples: None,
            architecture: None,
            scan_findings: Vec::new(),
        }
    }

    /// Project facts without the document body
    pub fn project_info(&self) -> String {
        let repo = &self.repository;
        let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

        let mut out = String::new();
        out.push_str("## Project\n");
        let _ = writeln!(out, "- Name: {}", repo.name);
        let _ = writeln!(out, "- URL: {}", repo.url);
        let _ = writeln!(out, "- Language: {}", or_unset(&repo.language));
        let _ = writeln!(out, "- Stars: {}", repo.stars);
        let _ = writeln!(out, "- Forks: {}", repo.forks);
        let _ = writeln!(out, "- License: {}", or_unset(&repo.license));
        let _ = writeln!(out, "- Description: {}", or_unset(&repo.description));

        if !self.authors.is_empty() {
            let names: Vec<&str> = self.authors.iter().map(|a| a.name.as_str()).collect();
            let _ = writeln!(out, "- Authors: {}", names.join(", "));
        }

        if let Some(arch) = &self.architecture {
            if !arch.programming_languages.is_empty() {
                let _ = writeln!(out, "- Detected languages: {}", arch.programming_languages.join(", "));
            }
            if !arch.frameworks.is_empty() {
                let _ = writeln!(out, "- Detected frameworks: {}", arch.frameworks.join(", "));
            }
        }
        out
    }

    /// Prompt-ready summary. Oversized inputs are truncated, never rejected.
    pub fn summary(&self, limits: &ContextLimits) -> String {
        let mut out = self.project_info();

        if let Some(document) = self.document.as_deref().filter(|d| !d.trim().is_empty()) {
            out.push_str("\n## README\n");
            out.push_str(truncate_chars(document, limits.document_chars));
            out.push('\n');
        }

        if let Some(code) = self.code_samples.as_deref().filter(|c| !c.trim().is_empty()) {
            out.push_str("\n## Core code samples\n");
            out.push_str(truncate_chars(code, limits.code_chars));
            out.push('\n');
        }

        truncate_chars(&out, limits.max_content_length).to_string()
    }
}

/// Longest prefix of at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
