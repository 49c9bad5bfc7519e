use crate::analysis::AnalysisReport;
use std::collections::BTreeMap;

const STYLE: &str = "body{font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;\
max-width:960px;margin:2rem auto;padding:0 1rem;color:#1f2328;line-height:1.5}\
h1{border-bottom:2px solid #2f81f7;padding-bottom:.3rem}\
h2{margin-top:2rem;border-bottom:1px solid #d0d7de}\
table{border-collapse:collapse}td,th{border:1px solid #d0d7de;padding:.3rem .6rem;text-align:left}\
pre{background:#f6f8fa;padding:.8rem;overflow-x:auto}";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Self-contained HTML page. All report text is escaped.
pub fn render_html(report: &AnalysisReport) -> String {
    let repo = &report.repository;
    let mut body = String::new();

    body.push_str(&format!("<h1>{} Analysis Report</h1>\n", escape_html(&repo.name)));
    if let Some(description) = &repo.description {
        body.push_str(&format!("<p><em>{}</em></p>\n", escape_html(description)));
    }

    let mut meta = BTreeMap::new();
    meta.insert("Repository".to_string(), repo.url.clone());
    meta.insert(
        "Language".to_string(),
        repo.language.clone().unwrap_or_else(|| "-".to_string()),
    );
    meta.insert("Stars".to_string(), repo.stars.to_string());
    meta.insert("Forks".to_string(), repo.forks.to_string());
    meta.insert(
        "License".to_string(),
        repo.license.clone().unwrap_or_else(|| "-".to_string()),
    );
    meta.insert("Analyzed".to_string(), report.analysis_timestamp.clone());
    table(&mut body, None, &meta);

    if !report.authors.is_empty() {
        let authors: Vec<String> = report
            .authors
            .iter()
            .map(|a| match &a.email {
                Some(email) => format!("{} <{}>", a.name, email),
                None => a.name.clone(),
            })
            .collect();
        section(&mut body, "Authors");
        list(&mut body, None, &authors);
    }

    if !report.publications.is_empty() {
        let publications: Vec<String> = report
            .publications
            .iter()
            .map(|p| {
                let mut line = p.title.clone();
                if let Some(journal) = &p.journal {
                    line.push_str(&format!(", {}", journal));
                }
                if let Some(year) = p.year {
                    line.push_str(&format!(" ({})", year));
                }
                if let Some(doi) = &p.doi {
                    line.push_str(&format!(" doi:{}", doi));
                }
                line
            })
            .collect();
        section(&mut body, "Publications");
        list(&mut body, None, &publications);
    }

    let functionality = &report.functionality;
    section(&mut body, "Functionality");
    body.push_str(&format!(
        "<p><strong>Main purpose:</strong> {}</p>\n",
        escape_html(&functionality.main_purpose)
    ));
    list(&mut body, Some("Key features"), &functionality.key_features);
    list(&mut body, Some("Input formats"), &functionality.input_formats);
    list(&mut body, Some("Output formats"), &functionality.output_formats);
    list(&mut body, Some("Dependencies"), &functionality.dependencies);

    let usage = &report.usage;
    section(&mut body, "Usage");
    body.push_str(&format!(
        "<h3>Installation</h3>\n<pre>{}</pre>\n<h3>Basic usage</h3>\n<pre>{}</pre>\n",
        escape_html(&usage.installation),
        escape_html(&usage.basic_usage)
    ));
    list(&mut body, Some("Examples"), &usage.examples);
    list(&mut body, Some("Parameters"), &usage.parameters);

    if let Some(arch) = &report.architecture {
        section(&mut body, "Architecture");
        list(&mut body, Some("Languages"), &arch.programming_languages);
        list(&mut body, Some("Frameworks"), &arch.frameworks);
        table(&mut body, Some("Directory structure"), &arch.directory_structure);
        list(&mut body, Some("Main components"), &arch.main_components);
        list(&mut body, Some("Entry points"), &arch.entry_points);
        list(&mut body, Some("Config files"), &arch.config_files);
        table(&mut body, Some("Tests"), &arch.test_structure);
    }

    if let Some(perf) = &report.performance {
        section(&mut body, "Performance");
        scalars(
            &mut body,
            &[
                ("Time complexity", &perf.time_complexity),
                ("Space complexity", &perf.space_complexity),
                ("Parallelization", &perf.parallelization),
                ("Resource usage", &perf.resource_usage),
            ],
        );
        list(&mut body, Some("Optimization suggestions"), &perf.optimization_suggestions);
    }

    if let Some(expertise) = &report.bioinformatics_expertise {
        section(&mut body, "Bioinformatics Expertise");
        list(&mut body, Some("Data types"), &expertise.data_types);
        scalars(&mut body, &[("Algorithm accuracy", &expertise.algorithm_accuracy)]);
        list(&mut body, Some("Applicable scenarios"), &expertise.applicable_scenarios);
        list(&mut body, Some("Standards compliance"), &expertise.standards_compliance);
    }

    if let Some(data) = &report.data_requirements {
        section(&mut body, "Data Requirements");
        list(&mut body, Some("Required inputs"), &data.required_inputs);
        list(&mut body, Some("Optional inputs"), &data.optional_inputs);
        list(&mut body, Some("Data formats"), &data.data_formats);
        scalars(&mut body, &[("File size limits", &data.file_size_limits)]);
        list(&mut body, Some("Preprocessing steps"), &data.preprocessing_steps);
    }

    if let Some(security) = &report.security_analysis {
        section(&mut body, "Security");
        list(&mut body, Some("Vulnerabilities"), &security.vulnerabilities);
        list(&mut body, Some("Sensitive data"), &security.sensitive_data);
        list(&mut body, Some("Dependencies"), &security.dependencies);
    }

    if let Some(quality) = &report.code_quality {
        section(&mut body, "Code Quality");
        scalars(
            &mut body,
            &[
                ("Structure", &quality.code_structure),
                ("Documentation", &quality.documentation_quality),
                ("Test coverage", &quality.test_coverage),
            ],
        );
        list(&mut body, Some("Best practices"), &quality.best_practices);
    }

    if let Some(deployment) = &report.deployment {
        section(&mut body, "Deployment");
        list(&mut body, Some("Installation methods"), &deployment.installation_methods);
        list(&mut body, Some("System requirements"), &deployment.system_requirements);
        list(&mut body, Some("Containers"), &deployment.container_support);
        list(&mut body, Some("Cloud"), &deployment.cloud_deployment);
        list(&mut body, Some("Configuration files"), &deployment.configuration_files);
    }

    if let Some(testing) = &report.testing {
        section(&mut body, "Testing");
        list(&mut body, Some("Test commands"), &testing.test_commands);
        list(&mut body, Some("Test data"), &testing.test_data_sources);
        list(&mut body, Some("Example datasets"), &testing.example_datasets);
        list(&mut body, Some("Validation"), &testing.validation_methods);
        list(&mut body, Some("Benchmarks"), &testing.benchmark_datasets);
    }

    if let Some(usability) = &report.usability {
        section(&mut body, "Usability");
        scalars(
            &mut body,
            &[
                ("Documentation", &usability.documentation_completeness),
                ("Learning curve", &usability.learning_curve),
                ("Community", &usability.community_support),
                ("Interface", &usability.user_interface),
            ],
        );
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} Analysis Report</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(&repo.name),
        STYLE,
        body
    )
}

fn section(body: &mut String, title: &str) {
    body.push_str(&format!("<h2>{}</h2>\n", title));
}

fn list(body: &mut String, title: Option<&str>, items: &[String]) {
    if items.is_empty() {
        return;
    }
    if let Some(title) = title {
        body.push_str(&format!("<h3>{}</h3>\n", title));
    }
    body.push_str("<ul>\n");
    for item in items {
        body.push_str(&format!("<li>{}</li>\n", escape_html(item)));
    }
    body.push_str("</ul>\n");
}

fn scalars(body: &mut String, rows: &[(&str, &Option<String>)]) {
    let present: Vec<_> = rows
        .iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| (*label, v)))
        .collect();
    if present.is_empty() {
        return;
    }
    body.push_str("<ul>\n");
    for (label, value) in present {
        body.push_str(&format!(
            "<li><strong>{}:</strong> {}</li>\n",
            label,
            escape_html(value)
        ));
    }
    body.push_str("</ul>\n");
}

fn table(body: &mut String, title: Option<&str>, rows: &BTreeMap<String, String>) {
    if rows.is_empty() {
        return;
    }
    if let Some(title) = title {
        body.push_str(&format!("<h3>{}</h3>\n", title));
    }
    body.push_str("<table>\n");
    for (key, value) in rows {
        body.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            escape_html(key),
            escape_html(value)
        ));
    }
    body.push_str("</table>\n");
}
