use crate::analysis::{self, AnalysisContext, AnalysisSettings, TaskCatalog};
use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::discovery::{collect_code_samples, read_primary_document, SampleLimits};
use crate::github::{
    analyze_architecture, clone_repository, extract_authors, GitHubClient, SecurityScanner,
};
use crate::history::{History, RunEntry};
use crate::output::write_reports;
use crate::provider;
use crate::storage::{RecordSink, SupabaseSink};
use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub async fn execute(args: AnalyzeArgs) -> anyhow::Result<()> {
    info!("Loading config from {:?}", args.config);
    let mut config = Config::resolve(&args.config, args.env_file.as_deref())?;

    // Apply CLI overrides
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(formats) = args.formats {
        config.formats = formats;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if args.no_security_scan {
        config.security.enabled = false;
    }

    config.validate()?;
    for issue in config.issues() {
        warn!("{}", issue);
    }

    let repo_url = args.repo_url.trim().to_string();
    let mut history = History::load(&config.output_dir);
    if let Some(last) = history.last_run(&repo_url) {
        println!(
            "Previously analyzed {} via the {} path",
            last.started_at.format("%Y-%m-%d %H:%M UTC"),
            last.path
        );
    }

    let started_at = Utc::now();
    let start = Instant::now();

    let clone = clone_repository(
        &repo_url,
        &config.tmp_dir,
        Duration::from_secs(config.github.clone_timeout_sec),
    )
    .await?;
    let repo_path = clone.path().to_path_buf();

    // Static context gathered before any inference
    let github = GitHubClient::new(&config.github)?;
    let mut context = AnalysisContext::new(github.fetch_repository(&repo_url).await);
    context.authors = extract_authors(&repo_path).await;
    info!("Found {} authors", context.authors.len());

    let architecture = analyze_architecture(&repo_path);
    context.architecture = (!architecture.is_empty()).then_some(architecture);
    context.document = read_primary_document(&repo_path);
    if context.document.is_none() {
        warn!("No README found in {}", repo_path.display());
    }
    if config.analysis.collect_code_samples {
        context.code_samples = match collect_code_samples(&repo_path, &SampleLimits::default()) {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Skipping code samples: {}", e);
                None
            }
        };
    }

    if config.security.enabled {
        let findings = SecurityScanner::new(&config.security).scan(&repo_path).await;
        context.scan_findings = findings.iter().map(ToString::to_string).collect();
    } else {
        info!("Security scan disabled");
    }

    let catalog = TaskCatalog::standard(&config.analysis.optional_groups);
    let settings = AnalysisSettings::from(&config.analysis);
    info!("Dispatching {} analysis tasks", catalog.len());

    let outcome = analysis::analyze(
        provider::connect(&config, &repo_path),
        &catalog,
        &context,
        &settings,
    )
    .await;
    let report = outcome.report;

    let written = write_reports(&config.output_dir, &report, &config.formats)?;

    if args.no_save_to_db {
        info!("Skipping database save (--no-save-to-db)");
    } else if !config.storage.is_configured() {
        warn!("Storage is not configured; result not saved");
    } else {
        let record = report.to_record()?;
        let saved = match SupabaseSink::new(&config.storage) {
            Ok(sink) => sink.save(&repo_url, &record).await,
            Err(e) => Err(e),
        };
        match saved {
            Ok(id) => println!("Saved to database as {}", id),
            Err(e) => warn!("Failed to save result: {}", e),
        }
    }

    let duration = start.elapsed();
    history.record(RunEntry {
        id: uuid::Uuid::new_v4().to_string(),
        repo_url: repo_url.clone(),
        started_at,
        finished_at: Utc::now(),
        duration_sec: duration.as_secs_f64(),
        backend: outcome.backend.map(str::to_string),
        path: outcome.path,
        groups: report.present_groups().iter().map(|g| g.to_string()).collect(),
        failed_roles: outcome.failures.iter().map(|f| f.role.clone()).collect(),
        reports: written.clone(),
    });
    if let Err(e) = history.save(&config.output_dir) {
        warn!("Failed to save history: {}", e);
    }

    if args.keep_clone && clone.is_temporary() {
        println!("Clone kept at {}", clone.persist().display());
    }

    // Summary
    println!(
        "\nAnalyzed {} in {:.1}s ({} path, backend: {})",
        report.repository.name,
        duration.as_secs_f64(),
        outcome.path,
        outcome.backend.unwrap_or("none")
    );
    println!("Main purpose: {}", report.functionality.main_purpose);
    let groups = report.present_groups();
    if groups.is_empty() {
        println!("Optional groups: none");
    } else {
        println!("Optional groups: {}", groups.join(", "));
    }
    if !outcome.failures.is_empty() {
        let roles: Vec<&str> = outcome.failures.iter().map(|f| f.role.as_str()).collect();
        println!("Failed roles: {}", roles.join(", "));
    }
    for path in &written {
        println!("Report: {}", path.display());
    }

    Ok(())
}
