use crate::analysis::AnalysisReport;
use std::collections::BTreeMap;

/// Render the report as Markdown. Optional groups appear only when present.
pub fn render_markdown(report: &AnalysisReport) -> String {
    let repo = &report.repository;
    let mut content = String::new();

    content.push_str(&format!("# {} Analysis Report\n\n", repo.name));

    // Metadata table
    content.push_str("| Field | Value |\n");
    content.push_str("|-------|-------|\n");
    content.push_str(&format!("| Repository | {} |\n", repo.url));
    content.push_str(&format!("| Language | {} |\n", or_dash(&repo.language)));
    content.push_str(&format!("| Stars | {} |\n", repo.stars));
    content.push_str(&format!("| Forks | {} |\n", repo.forks));
    content.push_str(&format!("| License | {} |\n", or_dash(&repo.license)));
    content.push_str(&format!("| Analyzed | {} |\n", report.analysis_timestamp));
    content.push('\n');

    if let Some(description) = &repo.description {
        content.push_str(&format!("> {}\n\n", description));
    }

    if !report.authors.is_empty() {
        content.push_str("## Authors\n\n");
        for author in &report.authors {
            match &author.email {
                Some(email) => content.push_str(&format!("- {} <{}>\n", author.name, email)),
                None => content.push_str(&format!("- {}\n", author.name)),
            }
        }
        content.push('\n');
    }

    if !report.publications.is_empty() {
        content.push_str("## Publications\n\n");
        for publication in &report.publications {
            content.push_str(&format!("- **{}**", publication.title));
            if !publication.authors.is_empty() {
                content.push_str(&format!(", {}", publication.authors.join(", ")));
            }
            if let Some(journal) = &publication.journal {
                content.push_str(&format!(", *{}*", journal));
            }
            if let Some(year) = publication.year {
                content.push_str(&format!(" ({})", year));
            }
            if let Some(doi) = &publication.doi {
                content.push_str(&format!(" doi:{}", doi));
            }
            content.push('\n');
        }
        content.push('\n');
    }

    let functionality = &report.functionality;
    content.push_str("## Functionality\n\n");
    content.push_str(&format!("**Main purpose:** {}\n\n", functionality.main_purpose));
    list(&mut content, "Key features", &functionality.key_features);
    list(&mut content, "Input formats", &functionality.input_formats);
    list(&mut content, "Output formats", &functionality.output_formats);
    list(&mut content, "Dependencies", &functionality.dependencies);

    let usage = &report.usage;
    content.push_str("## Usage\n\n");
    content.push_str(&format!("**Installation:**\n\n```\n{}\n```\n\n", usage.installation));
    content.push_str(&format!("**Basic usage:**\n\n```\n{}\n```\n\n", usage.basic_usage));
    list(&mut content, "Examples", &usage.examples);
    list(&mut content, "Parameters", &usage.parameters);

    if let Some(arch) = &report.architecture {
        content.push_str("## Architecture\n\n");
        list(&mut content, "Languages", &arch.programming_languages);
        list(&mut content, "Frameworks", &arch.frameworks);
        table(&mut content, "Directory structure", &arch.directory_structure);
        list(&mut content, "Main components", &arch.main_components);
        list(&mut content, "Entry points", &arch.entry_points);
        list(&mut content, "Config files", &arch.config_files);
        table(&mut content, "Tests", &arch.test_structure);
    }

    if let Some(perf) = &report.performance {
        content.push_str("## Performance\n\n");
        scalar(&mut content, "Time complexity", &perf.time_complexity);
        scalar(&mut content, "Space complexity", &perf.space_complexity);
        scalar(&mut content, "Parallelization", &perf.parallelization);
        scalar(&mut content, "Resource usage", &perf.resource_usage);
        content.push('\n');
        list(&mut content, "Optimization suggestions", &perf.optimization_suggestions);
    }

    if let Some(expertise) = &report.bioinformatics_expertise {
        content.push_str("## Bioinformatics Expertise\n\n");
        list(&mut content, "Data types", &expertise.data_types);
        scalar(&mut content, "Algorithm accuracy", &expertise.algorithm_accuracy);
        content.push('\n');
        list(&mut content, "Applicable scenarios", &expertise.applicable_scenarios);
        list(&mut content, "Standards compliance", &expertise.standards_compliance);
    }

    if let Some(data) = &report.data_requirements {
        content.push_str("## Data Requirements\n\n");
        list(&mut content, "Required inputs", &data.required_inputs);
        list(&mut content, "Optional inputs", &data.optional_inputs);
        list(&mut content, "Data formats", &data.data_formats);
        scalar(&mut content, "File size limits", &data.file_size_limits);
        content.push('\n');
        list(&mut content, "Preprocessing steps", &data.preprocessing_steps);
    }

    if let Some(security) = &report.security_analysis {
        content.push_str("## Security\n\n");
        list(&mut content, "Vulnerabilities", &security.vulnerabilities);
        list(&mut content, "Sensitive data", &security.sensitive_data);
        list(&mut content, "Dependencies", &security.dependencies);
    }

    if let Some(quality) = &report.code_quality {
        content.push_str("## Code Quality\n\n");
        scalar(&mut content, "Structure", &quality.code_structure);
        scalar(&mut content, "Documentation", &quality.documentation_quality);
        scalar(&mut content, "Test coverage", &quality.test_coverage);
        content.push('\n');
        list(&mut content, "Best practices", &quality.best_practices);
    }

    if let Some(deployment) = &report.deployment {
        content.push_str("## Deployment\n\n");
        list(&mut content, "Installation methods", &deployment.installation_methods);
        list(&mut content, "System requirements", &deployment.system_requirements);
        list(&mut content, "Containers", &deployment.container_support);
        list(&mut content, "Cloud", &deployment.cloud_deployment);
        list(&mut content, "Configuration files", &deployment.configuration_files);
    }

    if let Some(testing) = &report.testing {
        content.push_str("## Testing\n\n");
        list(&mut content, "Test commands", &testing.test_commands);
        list(&mut content, "Test data", &testing.test_data_sources);
        list(&mut content, "Example datasets", &testing.example_datasets);
        list(&mut content, "Validation", &testing.validation_methods);
        list(&mut content, "Benchmarks", &testing.benchmark_datasets);
    }

    if let Some(usability) = &report.usability {
        content.push_str("## Usability\n\n");
        scalar(&mut content, "Documentation", &usability.documentation_completeness);
        scalar(&mut content, "Learning curve", &usability.learning_curve);
        scalar(&mut content, "Community", &usability.community_support);
        scalar(&mut content, "Interface", &usability.user_interface);
        content.push('\n');
    }

    content
}

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn list(content: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    content.push_str(&format!("**{}:**\n", title));
    for item in items {
        content.push_str(&format!("- {}\n", item));
    }
    content.push('\n');
}

fn scalar(content: &mut String, title: &str, value: &Option<String>) {
    if let Some(value) = value {
        content.push_str(&format!("- **{}:** {}\n", title, value));
    }
}

fn table(content: &mut String, title: &str, rows: &BTreeMap<String, String>) {
    if rows.is_empty() {
        return;
    }
    content.push_str(&format!("**{}:**\n\n", title));
    content.push_str("| Path | Purpose |\n");
    content.push_str("|------|---------|\n");
    for (path, purpose) in rows {
        content.push_str(&format!("| `{}` | {} |\n", path, purpose));
    }
    content.push('\n');
}
