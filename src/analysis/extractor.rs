use super::catalog::{profile, AnalysisTask};
use crate::error::ExtractionError;
use crate::parser::parse_reply;
use crate::provider::{InferRequest, Session};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Turns one task plus prompt into a raw task result through the shared session
pub struct FactExtractor {
    session: Arc<dyn Session>,
}

impl FactExtractor {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self { session }
    }

    pub fn backend(&self) -> &'static str {
        self.session.name()
    }

    /// Full prompt used by the concurrent wave
    pub fn build_prompt(task: &AnalysisTask, summary: &str) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!("Act as the {} agent.\n\n", task.role));
        prompt.push_str(&format!("Task: {}\n\n", task.description));
        prompt.push_str(summary);
        prompt.push_str("\nBase the analysis on this information and on the repository contents.\n\n");
        prompt.push_str(&Self::output_contract(task));
        prompt
    }

    /// Reduced prompt for the sequential pass: repository name and task only
    pub fn simplified_prompt(task: &AnalysisTask, repository_name: &str) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!(
            "Analyze the bioinformatics project {} in the current repository.\n\n",
            repository_name
        ));
        prompt.push_str(&format!("Task: {}\n\n", task.description));
        prompt.push_str(&Self::output_contract(task));
        prompt
    }

    fn output_contract(task: &AnalysisTask) -> String {
        let focus: Vec<&str> = task.focus.iter().map(|g| g.key()).collect();
        let hints: Vec<&str> = task.focus.iter().map(|g| g.schema_hint()).collect();

        let mut out = String::new();
        out.push_str(&format!("Focus on: {}\n\n", focus.join(", ")));
        out.push_str("Respond with a single JSON object shaped like:\n{\n  ");
        out.push_str(&hints.join(",\n  "));
        out.push_str("\n}\n\n");
        out.push_str(
            "Rules:\n\
             1. Include only facts stated in the README or visible in the code.\n\
             2. Omit any field you have no information for. Never write placeholders such as \"unknown\" or \"N/A\".\n\
             3. Replace every <...> slot with real content or drop the field.\n\
             4. Output JSON only, with no commentary.\n",
        );
        out
    }

    pub async fn extract(
        &self,
        task: &AnalysisTask,
        prompt: String,
    ) -> Result<Map<String, Value>, ExtractionError> {
        let agent = profile(&task.role);
        let request = InferRequest {
            role: task.role.clone(),
            system: agent.map(|p| p.prompt.to_string()),
            prompt,
            tools: agent
                .map(|p| p.tools.iter().map(|t| t.to_string()).collect())
                .unwrap_or_default(),
        };

        let output = self
            .session
            .infer(&request)
            .await
            .map_err(|e| ExtractionError::Transport {
                role: task.role.clone(),
                source: e,
            })?;

        tracing::debug!("{} replied in {:?}", task.role, output.duration);
        parse_reply(&task.role, &output.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::catalog::{FieldGroup, TaskCatalog};
    use crate::error::{ExtractionErrorKind, ProviderError};
    use crate::provider::{ProviderOutput, Reply};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Recording {
        reply: Result<String, ()>,
        seen: Mutex<Vec<InferRequest>>,
    }

    #[async_trait]
    impl Session for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn infer(&self, request: &InferRequest) -> Result<ProviderOutput, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(ProviderOutput {
                    reply: Reply::from_text(text.clone()),
                    duration: Duration::ZERO,
                }),
                Err(()) => Err(ProviderError::Timeout(Duration::from_secs(1))),
            }
        }
    }

    fn first_task() -> AnalysisTask {
        TaskCatalog::standard(&FieldGroup::OPTIONAL).tasks()[0].clone()
    }

    #[test]
    fn test_prompt_lists_focus_and_hints() {
        let prompt = FactExtractor::build_prompt(&first_task(), "## Project\n- Name: bwa\n");
        assert!(prompt.contains("biotools-analyzer"));
        assert!(prompt.contains("- Name: bwa"));
        assert!(prompt.contains("Focus on: functionality, publications, architecture"));
        assert!(prompt.contains("\"main_purpose\""));
    }

    #[test]
    fn test_simplified_prompt_omits_context() {
        let prompt = FactExtractor::simplified_prompt(&first_task(), "bwa");
        assert!(prompt.contains("project bwa"));
        assert!(!prompt.contains("## Project"));
        assert!(prompt.contains("\"functionality\""));
    }

    #[tokio::test]
    async fn test_extract_sends_profile_and_parses() {
        let session = Arc::new(Recording {
            reply: Ok(r#"{"functionality": {"main_purpose": "Short read aligner"}}"#.to_string()),
            seen: Mutex::new(Vec::new()),
        });
        let extractor = FactExtractor::new(session.clone());
        let result = extractor
            .extract(&first_task(), "prompt".to_string())
            .await
            .unwrap();
        assert_eq!(
            result["functionality"]["main_purpose"],
            Value::String("Short read aligner".to_string())
        );

        let seen = session.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].system.as_deref().unwrap().contains("bioinformatics"));
        assert!(seen[0].tools.contains(&"WebSearch".to_string()));
    }

    #[tokio::test]
    async fn test_extract_transport_failure_is_tagged() {
        let extractor = FactExtractor::new(Arc::new(Recording {
            reply: Err(()),
            seen: Mutex::new(Vec::new()),
        }));
        let err = extractor
            .extract(&first_task(), "prompt".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ExtractionErrorKind::Transport);
        assert_eq!(err.role(), "biotools-analyzer");
    }
}
