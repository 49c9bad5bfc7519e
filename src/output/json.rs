use crate::analysis::AnalysisReport;
use crate::error::OutputError;

/// Pretty-printed nested record, the same shape that is persisted
pub fn render_json(report: &AnalysisReport) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(&report.to_record()?)?)
}
