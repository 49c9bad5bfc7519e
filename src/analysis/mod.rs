mod assembler;
mod catalog;
mod context;
mod extractor;
mod orchestrator;
mod types;

pub use assembler::{assemble, fallback_report};
#[cfg(test)]
pub use assembler::{DEFAULT_INSTRUCTIONS, DEFAULT_MAIN_PURPOSE};
pub use catalog::{profile, AnalysisTask, FieldGroup, TaskCatalog, AGENT_PROFILES};
pub use context::{truncate_chars, AnalysisContext, ContextLimits};
pub use extractor::FactExtractor;
pub use orchestrator::{DispatchPath, Orchestrator, TaskFailure};
pub use types::*;

use crate::config::AnalysisConfig;
use crate::error::ProviderError;
use crate::provider::Session;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub dispatch_timeout: Duration,
    pub limits: ContextLimits,
}

impl From<&AnalysisConfig> for AnalysisSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(config.dispatch_timeout_sec),
            limits: ContextLimits::from(config),
        }
    }
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub path: DispatchPath,
    pub failures: Vec<TaskFailure>,
    /// `None` when no session could be opened
    pub backend: Option<&'static str>,
}

/// Analyze a repository, always producing a report.
///
/// When the session cannot be opened the static fallback report is
/// returned; task and wave failures only thin out the optional groups.
pub async fn analyze<F>(
    connect: F,
    catalog: &TaskCatalog,
    context: &AnalysisContext,
    settings: &AnalysisSettings,
) -> AnalysisOutcome
where
    F: Future<Output = Result<Arc<dyn Session>, ProviderError>>,
{
    let session = match connect.await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Inference backend unavailable ({}); using fallback report", e);
            return AnalysisOutcome {
                report: fallback_report(context),
                path: DispatchPath::Fallback,
                failures: Vec::new(),
                backend: None,
            };
        }
    };

    let backend = session.name();
    let orchestrator = Orchestrator::new(
        FactExtractor::new(session),
        settings.dispatch_timeout,
        settings.limits,
    );
    let run = orchestrator.run_analysis(catalog, context).await;

    tracing::info!(
        "Analysis finished via {} path in {:?} ({} task failures)",
        run.path,
        run.duration,
        run.failures.len()
    );

    AnalysisOutcome {
        report: assemble(&run.record, context),
        path: run.path,
        failures: run.failures,
        backend: Some(backend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InferRequest, ProviderOutput, Reply};
    use async_trait::async_trait;

    struct Canned;

    #[async_trait]
    impl Session for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn infer(&self, request: &InferRequest) -> Result<ProviderOutput, ProviderError> {
            let text = match request.role.as_str() {
                "biotools-analyzer" => {
                    r#"{"functionality": {"main_purpose": "unknown", "key_features": ["k-mer counting"]}, "performance": {"parallelization": "OpenMP"}}"#
                }
                "security-auditor" => "no findings",
                _ => r#"{"usage": {"installation": "conda install -c bioconda jellyfish"}}"#,
            };
            Ok(ProviderOutput {
                reply: Reply::from_text(text),
                duration: Duration::ZERO,
            })
        }
    }

    fn context() -> AnalysisContext {
        AnalysisContext::new(RepositoryInfo::basic(
            "jellyfish",
            "https://github.com/gmarcais/Jellyfish",
        ))
    }

    #[tokio::test]
    async fn test_unavailable_backend_yields_fallback_report() {
        let outcome = analyze(
            async { Err::<Arc<dyn Session>, _>(ProviderError::Unavailable("no backend".to_string())) },
            &TaskCatalog::standard(&FieldGroup::OPTIONAL),
            &context(),
            &AnalysisSettings::from(&AnalysisConfig::default()),
        )
        .await;

        assert_eq!(outcome.path, DispatchPath::Fallback);
        assert!(outcome.backend.is_none());
        assert_eq!(outcome.report.functionality.main_purpose, DEFAULT_MAIN_PURPOSE);
        assert_eq!(outcome.report.usage.basic_usage, DEFAULT_INSTRUCTIONS);
        assert!(outcome.report.present_groups().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_with_canned_session() {
        let session: Arc<dyn Session> = Arc::new(Canned);
        let outcome = analyze(
            async { Ok::<_, ProviderError>(session) },
            &TaskCatalog::standard(&FieldGroup::OPTIONAL),
            &context(),
            &AnalysisSettings::from(&AnalysisConfig::default()),
        )
        .await;

        assert_eq!(outcome.path, DispatchPath::Parallel);
        assert_eq!(outcome.backend, Some("canned"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].role, "security-auditor");

        let report = outcome.report;
        assert_eq!(report.functionality.main_purpose, DEFAULT_MAIN_PURPOSE);
        assert_eq!(report.functionality.key_features, vec!["k-mer counting".to_string()]);
        assert_eq!(report.usage.installation, "conda install -c bioconda jellyfish");
        assert_eq!(report.present_groups(), vec!["performance"]);
        assert!(report.security_analysis.is_none());
    }
}
