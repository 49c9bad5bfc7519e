use super::context::AnalysisContext;
use super::orchestrator::MergedRecord;
use super::types::*;
use crate::parser::is_placeholder;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_MAIN_PURPOSE: &str = "bioinformatics tool";
pub const DEFAULT_INSTRUCTIONS: &str = "see project documentation";

/// Build the typed report from a merged record.
///
/// Mandatory fields fall back to their documented defaults. An optional
/// group is `None` unless at least one real field was extracted for it.
pub fn assemble(record: &MergedRecord, context: &AnalysisContext) -> AnalysisReport {
    let architecture = context
        .architecture
        .clone()
        .filter(|arch| !arch.is_empty())
        .or_else(|| group(record, "architecture").and_then(architecture));

    AnalysisReport {
        repository: context.repository.clone(),
        authors: context.authors.clone(),
        publications: publications(record.get("publications")),
        functionality: functionality(group(record, "functionality")),
        usage: usage(group(record, "usage")),
        architecture,
        performance: group(record, "performance").and_then(performance),
        bioinformatics_expertise: group(record, "bioinformatics_expertise").and_then(expertise),
        data_requirements: group(record, "data_requirements").and_then(data_requirements),
        security_analysis: with_scan_findings(
            group(record, "security_analysis").and_then(security),
            &context.scan_findings,
        ),
        code_quality: group(record, "code_quality").and_then(code_quality),
        deployment: group(record, "deployment").and_then(deployment),
        testing: group(record, "testing").and_then(testing),
        usability: group(record, "usability").and_then(usability),
        analysis_timestamp: timestamp(),
    }
}

/// Report used when no inference backend could be reached at all
pub fn fallback_report(context: &AnalysisContext) -> AnalysisReport {
    AnalysisReport {
        repository: context.repository.clone(),
        authors: context.authors.clone(),
        publications: Vec::new(),
        functionality: functionality(None),
        usage: usage(None),
        architecture: None,
        performance: None,
        bioinformatics_expertise: None,
        data_requirements: None,
        security_analysis: with_scan_findings(None, &context.scan_findings),
        code_quality: None,
        deployment: None,
        testing: None,
        usability: None,
        analysis_timestamp: timestamp(),
    }
}

fn timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

fn group<'a>(record: &'a MergedRecord, key: &str) -> Option<&'a Map<String, Value>> {
    record.get(key).and_then(Value::as_object)
}

fn nonempty<T: Default + PartialEq>(value: T) -> Option<T> {
    (value != T::default()).then_some(value)
}

/// Scalar text; lists are joined with spaces
fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    let value = map.get(key)?;
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(" "),
        _ => return None,
    };
    (!is_placeholder(&text)).then_some(text)
}

fn text_or(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(map, key))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        // {"name": "...", "description": "..."} style entries
        Value::Object(fields) => fields
            .values()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !is_placeholder(s))
            .collect::<Vec<_>>()
            .join(" - "),
        _ => return None,
    };
    (!is_placeholder(&text)).then_some(text)
}

/// List of strings; a lone string becomes a one-item list
fn list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(value @ Value::String(_)) => scalar_text(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn string_map(map: &Map<String, Value>, key: &str) -> BTreeMap<String, String> {
    map.get(key)
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(k, v)| scalar_text(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}

fn publications(value: Option<&Value>) -> Vec<Publication> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|p| {
            let title = text(p, "title")?;
            Some(Publication {
                title,
                authors: list(p, "authors"),
                journal: text(p, "journal"),
                year: p.get("year").and_then(year),
                doi: text(p, "doi"),
                pmid: text(p, "pmid"),
            })
        })
        .collect()
}

fn year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn functionality(map: Option<&Map<String, Value>>) -> FunctionalityInfo {
    let empty = Map::new();
    let map = map.unwrap_or(&empty);
    FunctionalityInfo {
        main_purpose: text(map, "main_purpose").unwrap_or_else(|| DEFAULT_MAIN_PURPOSE.to_string()),
        key_features: list(map, "key_features"),
        input_formats: list(map, "input_formats"),
        output_formats: list(map, "output_formats"),
        dependencies: list(map, "dependencies"),
    }
}

fn usage(map: Option<&Map<String, Value>>) -> UsageInfo {
    let empty = Map::new();
    let map = map.unwrap_or(&empty);
    UsageInfo {
        installation: text(map, "installation").unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        basic_usage: text(map, "basic_usage").unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        examples: list(map, "examples"),
        parameters: list(map, "parameters"),
    }
}

fn architecture(map: &Map<String, Value>) -> Option<ProjectArchitecture> {
    nonempty(ProjectArchitecture {
        programming_languages: list(map, "programming_languages"),
        frameworks: list(map, "frameworks"),
        directory_structure: string_map(map, "directory_structure"),
        main_components: list(map, "main_components"),
        entry_points: list(map, "entry_points"),
        config_files: list(map, "config_files"),
        test_structure: string_map(map, "test_structure"),
    })
}

fn performance(map: &Map<String, Value>) -> Option<PerformanceInfo> {
    nonempty(PerformanceInfo {
        time_complexity: text_or(map, &["time_complexity", "algorithm_complexity"]),
        space_complexity: text(map, "space_complexity"),
        parallelization: text_or(map, &["parallelization", "optimization_features"]),
        resource_usage: text_or(map, &["resource_usage", "resource_requirements"]),
        optimization_suggestions: list(map, "optimization_suggestions"),
    })
}

fn expertise(map: &Map<String, Value>) -> Option<BioinformaticsExpertise> {
    nonempty(BioinformaticsExpertise {
        data_types: list(map, "data_types"),
        algorithm_accuracy: text(map, "algorithm_accuracy"),
        applicable_scenarios: list(map, "applicable_scenarios"),
        standards_compliance: list(map, "standards_compliance"),
    })
}

fn data_requirements(map: &Map<String, Value>) -> Option<DataRequirements> {
    nonempty(DataRequirements {
        required_inputs: list(map, "required_inputs"),
        optional_inputs: list(map, "optional_inputs"),
        data_formats: list(map, "data_formats"),
        file_size_limits: text(map, "file_size_limits"),
        preprocessing_steps: list(map, "preprocessing_steps"),
    })
}

fn security(map: &Map<String, Value>) -> Option<SecurityAnalysis> {
    nonempty(SecurityAnalysis {
        vulnerabilities: list(map, "vulnerabilities"),
        sensitive_data: list(map, "sensitive_data"),
        dependencies: list(map, "dependencies"),
    })
}

/// Auditor findings are appended to the model's vulnerabilities, skipping repeats
fn with_scan_findings(
    security: Option<SecurityAnalysis>,
    findings: &[String],
) -> Option<SecurityAnalysis> {
    if findings.is_empty() {
        return security;
    }
    let mut security = security.unwrap_or_default();
    for finding in findings {
        if !security.vulnerabilities.contains(finding) {
            security.vulnerabilities.push(finding.clone());
        }
    }
    Some(security)
}

fn code_quality(map: &Map<String, Value>) -> Option<CodeQualityInfo> {
    nonempty(CodeQualityInfo {
        code_structure: text(map, "code_structure"),
        documentation_quality: text(map, "documentation_quality"),
        test_coverage: text(map, "test_coverage"),
        best_practices: list(map, "best_practices"),
    })
}

fn deployment(map: &Map<String, Value>) -> Option<DeploymentInfo> {
    nonempty(DeploymentInfo {
        installation_methods: list(map, "installation_methods"),
        system_requirements: list(map, "system_requirements"),
        container_support: list(map, "container_support"),
        cloud_deployment: list(map, "cloud_deployment"),
        configuration_files: list(map, "configuration_files"),
    })
}

fn testing(map: &Map<String, Value>) -> Option<TestingInfo> {
    nonempty(TestingInfo {
        test_commands: list(map, "test_commands"),
        test_data_sources: list(map, "test_data_sources"),
        example_datasets: list(map, "example_datasets"),
        validation_methods: list(map, "validation_methods"),
        benchmark_datasets: list(map, "benchmark_datasets"),
    })
}

fn usability(map: &Map<String, Value>) -> Option<UsabilityInfo> {
    nonempty(UsabilityInfo {
        documentation_completeness: text(map, "documentation_completeness"),
        learning_curve: text(map, "learning_curve"),
        community_support: text(map, "community_support"),
        user_interface: text(map, "user_interface"),
    })
}
