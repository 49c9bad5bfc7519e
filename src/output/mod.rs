mod html;
mod json;
mod markdown;

use html::render_html;
use json::render_json;
use markdown::render_markdown;

use crate::analysis::AnalysisReport;
use crate::error::OutputError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    #[serde(alias = "md")]
    #[value(alias = "md")]
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }

    fn render(&self, report: &AnalysisReport) -> Result<String, OutputError> {
        match self {
            ReportFormat::Html => Ok(render_html(report)),
            ReportFormat::Markdown => Ok(render_markdown(report)),
            ReportFormat::Json => render_json(report),
        }
    }
}

/// Write `{name}_analysis.{ext}` for every requested format.
/// Returns the written paths in request order; duplicates are written once.
pub fn write_reports(
    dir: &Path,
    report: &AnalysisReport,
    formats: &[ReportFormat],
) -> Result<Vec<PathBuf>, OutputError> {
    fs::create_dir_all(dir).map_err(OutputError::CreateDir)?;

    let stem = format!("{}_analysis", sanitize_filename(&report.repository.name));
    let mut written = Vec::new();

    for format in formats {
        let path = dir.join(format!("{}.{}", stem, format.extension()));
        if written.contains(&path) {
            continue;
        }
        let content = format.render(report)?;
        fs::write(&path, content).map_err(OutputError::WriteReport)?;
        info!("Wrote {} report to {}", format.extension(), path.display());
        written.push(path);
    }

    Ok(written)
}

/// Characters outside `[A-Za-z0-9_.-]` become `_`, runs collapse, edges trimmed
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "repository".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{fallback_report, AnalysisContext, RepositoryInfo};

    fn report(name: &str) -> AnalysisReport {
        fallback_report(&AnalysisContext::new(RepositoryInfo::basic(
            name,
            "https://github.com/lab/tool",
        )))
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("bwa"), "bwa");
        assert_eq!(sanitize_filename("my tool / v2!"), "my_tool_v2");
        assert_eq!(sanitize_filename("__x__"), "x");
        assert_eq!(sanitize_filename("samtools-1.19.tar"), "samtools-1.19.tar");
        assert_eq!(sanitize_filename("???"), "repository");
    }

    #[test]
    fn test_write_reports_all_formats() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_reports(
            dir.path(),
            &report("my tool"),
            &[
                ReportFormat::Html,
                ReportFormat::Markdown,
                ReportFormat::Json,
                ReportFormat::Json,
            ],
        )
        .unwrap();

        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "my_tool_analysis.html",
                "my_tool_analysis.md",
                "my_tool_analysis.json"
            ]
        );
        for path in &paths {
            assert!(!std::fs::read_to_string(path).unwrap().is_empty());
        }
    }

    #[test]
    fn test_format_names() {
        let formats: Vec<ReportFormat> = serde_yaml::from_str("[html, md, markdown, json]").unwrap();
        assert_eq!(
            formats,
            vec![
                ReportFormat::Html,
                ReportFormat::Markdown,
                ReportFormat::Markdown,
                ReportFormat::Json
            ]
        );
        assert_eq!(ReportFormat::Markdown.extension(), "md");
    }
}
