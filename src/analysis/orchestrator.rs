use super::catalog::{AnalysisTask, TaskCatalog};
use super::context::{AnalysisContext, ContextLimits};
use super::extractor::FactExtractor;
use crate::error::{AnalysisError, ExtractionError, ExtractionErrorKind};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Field-group name to extracted fields, merged across all tasks
pub type MergedRecord = Map<String, Value>;

type TaskResult = Result<Map<String, Value>, ExtractionError>;

/// Which branch produced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPath {
    Parallel,
    Sequential,
    Fallback,
}

impl std::fmt::Display for DispatchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchPath::Parallel => write!(f, "parallel"),
            DispatchPath::Sequential => write!(f, "sequential"),
            DispatchPath::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transport,
    Parse,
    /// The task panicked or was cancelled
    Crashed,
}

impl From<ExtractionErrorKind> for FailureKind {
    fn from(kind: ExtractionErrorKind) -> Self {
        match kind {
            ExtractionErrorKind::Transport => FailureKind::Transport,
            ExtractionErrorKind::Parse => FailureKind::Parse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub role: String,
    pub kind: FailureKind,
}

#[derive(Debug)]
pub struct AnalysisRun {
    pub record: MergedRecord,
    pub path: DispatchPath,
    pub failures: Vec<TaskFailure>,
    pub duration: Duration,
}

pub struct Orchestrator {
    extractor: Arc<FactExtractor>,
    dispatch_timeout: Duration,
    limits: ContextLimits,
}

impl Orchestrator {
    pub fn new(extractor: FactExtractor, dispatch_timeout: Duration, limits: ContextLimits) -> Self {
        Self {
            extractor: Arc::new(extractor),
            dispatch_timeout,
            limits,
        }
    }

    /// Run every catalog task and merge the results.
    ///
    /// A failed or crashed task contributes `{}`. Only the wave missing its
    /// deadline falls back to one sequential pass.
    pub async fn run_analysis(&self, catalog: &TaskCatalog, context: &AnalysisContext) -> AnalysisRun {
        let start = Instant::now();
        let summary = context.summary(&self.limits);

        info!(
            "Dispatching {} analysis tasks via {}",
            catalog.len(),
            self.extractor.backend()
        );

        let (results, path) = match self.dispatch_parallel(catalog, &summary).await {
            Ok(results) => (results, DispatchPath::Parallel),
            Err(e) => {
                warn!("Parallel analysis failed: {}; retrying tasks sequentially", e);
                let results = self
                    .dispatch_sequential(catalog, &context.repository.name)
                    .await;
                (results, DispatchPath::Sequential)
            }
        };

        let mut failures = Vec::new();
        let mut slots = Vec::with_capacity(results.len());
        for (task, result) in catalog.tasks().iter().zip(results) {
            match result {
                Ok(Ok(fields)) => slots.push(fields),
                Ok(Err(e)) => {
                    warn!("Task {} failed: {}", task.role, e);
                    failures.push(TaskFailure {
                        role: task.role.clone(),
                        kind: e.kind().into(),
                    });
                    slots.push(Map::new());
                }
                Err(reason) => {
                    warn!("Task {} crashed: {}", task.role, reason);
                    failures.push(TaskFailure {
                        role: task.role.clone(),
                        kind: FailureKind::Crashed,
                    });
                    slots.push(Map::new());
                }
            }
        }

        AnalysisRun {
            record: merge(slots),
            path,
            failures,
            duration: start.elapsed(),
        }
    }

    /// One wave, one spawned task per catalog entry. Results are slotted by
    /// catalog index; a crashed task fills only its own slot. Only the
    /// shared deadline fails the wave.
    async fn dispatch_parallel(
        &self,
        catalog: &TaskCatalog,
        summary: &str,
    ) -> Result<Vec<Result<TaskResult, String>>, AnalysisError> {
        let mut futures = FuturesUnordered::new();
        let mut abort_handles = Vec::with_capacity(catalog.len());

        for (idx, task) in catalog.tasks().iter().enumerate() {
            let extractor = self.extractor.clone();
            let task = task.clone();
            let prompt = FactExtractor::build_prompt(&task, summary);

            let handle = tokio::spawn(async move { extractor.extract(&task, prompt).await });
            abort_handles.push(handle.abort_handle());
            futures.push(handle.map(move |joined| (idx, joined)));
        }

        let mut slots: Vec<Option<Result<TaskResult, String>>> =
            (0..catalog.len()).map(|_| None).collect();

        let await_all = async {
            while let Some((idx, joined)) = futures.next().await {
                slots[idx] = Some(joined.map_err(|e| e.to_string()));
            }
        };

        if tokio::time::timeout(self.dispatch_timeout, await_all).await.is_err() {
            // Abandon the whole wave together
            for handle in &abort_handles {
                handle.abort();
            }
            return Err(AnalysisError::DispatchTimeout(self.dispatch_timeout));
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err("no result recorded".to_string())))
            .collect())
    }

    /// Each task once, in catalog order, with the simplified prompt
    async fn dispatch_sequential(
        &self,
        catalog: &TaskCatalog,
        repository_name: &str,
    ) -> Vec<Result<TaskResult, String>> {
        let mut results = Vec::with_capacity(catalog.len());

        for task in catalog.tasks() {
            info!("Sequential pass: {}", task.description);
            results.push(self.run_isolated(task, repository_name).await);
        }
        results
    }

    async fn run_isolated(&self, task: &AnalysisTask, repository_name: &str) -> Result<TaskResult, String> {
        let extractor = self.extractor.clone();
        let task = task.clone();
        let prompt = FactExtractor::simplified_prompt(&task, repository_name);

        tokio::spawn(async move { extractor.extract(&task, prompt).await })
            .await
            .map_err(|e| e.to_string())
    }
}

/// Union the per-task records in catalog order; later keys win
pub fn merge(results: Vec<Map<String, Value>>) -> MergedRecord {
    let mut merged = Map::new();
    for fields in results {
        for (key, value) in fields {
            merged.insert(key, value);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::catalog::FieldGroup;
    use crate::analysis::types::RepositoryInfo;
    use crate::error::ProviderError;
    use crate::provider::{InferRequest, ProviderOutput, Reply, Session};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum Behavior {
        Reply(&'static str),
        ReplyAfter(&'static str, Duration),
        TimeOut,
        Garbage,
        /// Panics on the first call only
        PanicOnce(&'static str),
        /// Never answers the full prompt; answers the simplified one
        HangOnFullPrompt(&'static str),
    }

    struct StubSession {
        behaviors: HashMap<&'static str, Behavior>,
        calls: AtomicUsize,
        panics: AtomicUsize,
    }

    impl StubSession {
        fn new(behaviors: Vec<(&'static str, Behavior)>) -> Self {
            Self {
                behaviors: behaviors.into_iter().collect(),
                calls: AtomicUsize::new(0),
                panics: AtomicUsize::new(0),
            }
        }
    }

    fn reply(text: &str) -> Result<ProviderOutput, ProviderError> {
        Ok(ProviderOutput {
            reply: Reply::from_text(text),
            duration: Duration::ZERO,
        })
    }

    #[async_trait]
    impl Session for StubSession {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn infer(&self, request: &InferRequest) -> Result<ProviderOutput, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviors.get(request.role.as_str()).cloned() {
                Some(Behavior::Reply(text)) => reply(text),
                Some(Behavior::ReplyAfter(text, delay)) => {
                    tokio::time::sleep(delay).await;
                    reply(text)
                }
                Some(Behavior::TimeOut) => Err(ProviderError::Timeout(Duration::from_secs(60))),
                Some(Behavior::Garbage) => reply("I could not analyze this repository."),
                Some(Behavior::PanicOnce(text)) => {
                    if self.panics.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("session broke");
                    }
                    reply(text)
                }
                Some(Behavior::HangOnFullPrompt(text)) => {
                    if request.prompt.contains("## Project") {
                        std::future::pending::<()>().await;
                    }
                    reply(text)
                }
                None => reply("{}"),
            }
        }
    }

    fn task(role: &str, focus: FieldGroup) -> AnalysisTask {
        AnalysisTask {
            role: role.to_string(),
            description: format!("{} task", role),
            focus: vec![focus],
        }
    }

    fn abc_catalog() -> TaskCatalog {
        TaskCatalog::from_tasks(vec![
            task("A", FieldGroup::Functionality),
            task("B", FieldGroup::Performance),
            task("C", FieldGroup::Usage),
        ])
    }

    fn context() -> AnalysisContext {
        AnalysisContext::new(RepositoryInfo::basic("tool", "https://github.com/o/tool"))
    }

    fn orchestrator(session: Arc<StubSession>, deadline: Duration) -> Orchestrator {
        Orchestrator::new(
            FactExtractor::new(session),
            deadline,
            ContextLimits::default(),
        )
    }

    const FUNCTIONALITY: &str = r#"{"functionality": {"main_purpose": "Aligns reads"}}"#;
    const USAGE: &str = r#"{"usage": {"installation": "conda install tool"}}"#;
    const PERFORMANCE: &str = r#"{"performance": {"time_complexity": "O(n)"}}"#;

    #[tokio::test]
    async fn test_one_task_timing_out_is_absorbed() {
        let session = Arc::new(StubSession::new(vec![
            ("A", Behavior::Reply(FUNCTIONALITY)),
            ("B", Behavior::TimeOut),
            ("C", Behavior::Reply(USAGE)),
        ]));
        let run = orchestrator(session.clone(), Duration::from_secs(5))
            .run_analysis(&abc_catalog(), &context())
            .await;

        assert_eq!(run.path, DispatchPath::Parallel);
        assert_eq!(
            Value::Object(run.record),
            json!({
                "functionality": {"main_purpose": "Aligns reads"},
                "usage": {"installation": "conda install tool"}
            })
        );
        assert_eq!(
            run.failures,
            vec![TaskFailure {
                role: "B".to_string(),
                kind: FailureKind::Transport
            }]
        );
        // No sequential retries
        assert_eq!(session.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_parse_failure_isolated() {
        let session = Arc::new(StubSession::new(vec![
            ("A", Behavior::Reply(FUNCTIONALITY)),
            ("B", Behavior::Garbage),
            ("C", Behavior::Reply(USAGE)),
        ]));
        let run = orchestrator(session, Duration::from_secs(5))
            .run_analysis(&abc_catalog(), &context())
            .await;

        assert_eq!(run.path, DispatchPath::Parallel);
        assert_eq!(run.record.len(), 2);
        assert_eq!(run.failures[0].kind, FailureKind::Parse);
    }

    #[tokio::test]
    async fn test_merge_precedence_follows_catalog_not_completion() {
        // A finishes last but C is later in the catalog and must win
        let session = Arc::new(StubSession::new(vec![
            (
                "A",
                Behavior::ReplyAfter(
                    r#"{"functionality": {"main_purpose": "from A"}}"#,
                    Duration::from_millis(50),
                ),
            ),
            ("B", Behavior::Reply(PERFORMANCE)),
            ("C", Behavior::Reply(r#"{"functionality": {"main_purpose": "from C"}}"#)),
        ]));
        let run = orchestrator(session, Duration::from_secs(5))
            .run_analysis(&abc_catalog(), &context())
            .await;

        assert_eq!(run.record["functionality"]["main_purpose"], json!("from C"));
        assert!(run.record.contains_key("performance"));
    }

    #[tokio::test]
    async fn test_dispatch_deadline_triggers_sequential_pass() {
        let session = Arc::new(StubSession::new(vec![
            ("A", Behavior::HangOnFullPrompt(FUNCTIONALITY)),
            ("B", Behavior::Reply(PERFORMANCE)),
            ("C", Behavior::Reply(USAGE)),
        ]));
        let run = orchestrator(session.clone(), Duration::from_millis(50))
            .run_analysis(&abc_catalog(), &context())
            .await;

        assert_eq!(run.path, DispatchPath::Sequential);
        assert!(run.failures.is_empty());
        assert_eq!(run.record.len(), 3);
        assert_eq!(session.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_sequential_pass_matches_parallel_output() {
        let behaviors = |a: Behavior| {
            vec![
                ("A", a),
                ("B", Behavior::Reply(PERFORMANCE)),
                ("C", Behavior::Reply(USAGE)),
            ]
        };

        let parallel = orchestrator(
            Arc::new(StubSession::new(behaviors(Behavior::Reply(FUNCTIONALITY)))),
            Duration::from_secs(5),
        )
        .run_analysis(&abc_catalog(), &context())
        .await;

        let degraded = orchestrator(
            Arc::new(StubSession::new(behaviors(Behavior::HangOnFullPrompt(FUNCTIONALITY)))),
            Duration::from_millis(50),
        )
        .run_analysis(&abc_catalog(), &context())
        .await;

        assert_eq!(parallel.path, DispatchPath::Parallel);
        assert_eq!(degraded.path, DispatchPath::Sequential);
        assert_eq!(parallel.record, degraded.record);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_abort_siblings() {
        let session = Arc::new(StubSession::new(vec![
            ("A", Behavior::ReplyAfter(FUNCTIONALITY, Duration::from_millis(100))),
            ("B", Behavior::PanicOnce(PERFORMANCE)),
            ("C", Behavior::ReplyAfter(USAGE, Duration::from_millis(100))),
        ]));
        let run = orchestrator(session.clone(), Duration::from_secs(5))
            .run_analysis(&abc_catalog(), &context())
            .await;

        assert_eq!(run.path, DispatchPath::Parallel);
        assert_eq!(
            Value::Object(run.record),
            json!({
                "functionality": {"main_purpose": "Aligns reads"},
                "usage": {"installation": "conda install tool"}
            })
        );
        assert_eq!(
            run.failures,
            vec![TaskFailure {
                role: "B".to_string(),
                kind: FailureKind::Crashed
            }]
        );
        assert_eq!(session.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sequential_failures_contribute_empty() {
        let session = Arc::new(StubSession::new(vec![
            ("A", Behavior::HangOnFullPrompt(FUNCTIONALITY)),
            ("B", Behavior::TimeOut),
            ("C", Behavior::Garbage),
        ]));
        let run = orchestrator(session, Duration::from_millis(50))
            .run_analysis(&abc_catalog(), &context())
            .await;

        assert_eq!(run.path, DispatchPath::Sequential);
        assert_eq!(Value::Object(run.record), json!({"functionality": {"main_purpose": "Aligns reads"}}));
        let roles: Vec<_> = run.failures.iter().map(|f| f.role.as_str()).collect();
        assert_eq!(roles, vec!["B", "C"]);
    }

    #[test]
    fn test_merge_last_writer_wins() {
        let first = json!({"functionality": {"main_purpose": "one"}, "usage": {"installation": "pip"}});
        let second = json!({"functionality": {"key_features": ["two"]}});
        let merged = merge(vec![
            first.as_object().unwrap().clone(),
            Map::new(),
            second.as_object().unwrap().clone(),
        ]);
        assert_eq!(
            Value::Object(merged),
            json!({"functionality": {"key_features": ["two"]}, "usage": {"installation": "pip"}})
        );
    }
}
