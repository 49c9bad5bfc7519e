use super::{InferRequest, ProviderOutput, Reply, Session};
use crate::config::AgentConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout as tokio_timeout;

pub struct ClaudeSession {
    binary: PathBuf,
    model: String,
    max_turns: u32,
    permission_mode: String,
    tools_override: Option<Vec<String>>,
    api_key: Option<String>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ClaudeSession {
    pub fn new(config: &AgentConfig, working_dir: &Path) -> Result<Self, ProviderError> {
        let binary = locate_binary(&config.binary).ok_or_else(|| {
            ProviderError::Unavailable(format!(
                "agent CLI '{}' not found",
                config.binary.display()
            ))
        })?;

        Ok(Self {
            binary,
            model: config.model.clone(),
            max_turns: config.max_turns,
            permission_mode: config.permission_mode.clone(),
            tools_override: config.tools.clone(),
            api_key: config.api_key.clone(),
            working_dir: working_dir.to_path_buf(),
            timeout: Duration::from_secs(config.timeout_sec),
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn build_command(&self, request: &InferRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.working_dir);
        cmd.kill_on_drop(true);

        // Subscription auth unless a key was configured explicitly
        match &self.api_key {
            Some(key) => {
                cmd.env("ANTHROPIC_API_KEY", key);
            }
            None => {
                cmd.env_remove("ANTHROPIC_API_KEY");
            }
        }

        let tools = self
            .tools_override
            .as_ref()
            .unwrap_or(&request.tools)
            .join(",");

        cmd.arg("-p")
            .arg(&request.prompt)
            .arg("--model")
            .arg(&self.model)
            .arg("--output-format")
            .arg("json")
            .arg("--max-turns")
            .arg(self.max_turns.to_string())
            .arg("--permission-mode")
            .arg(&self.permission_mode);

        if !tools.is_empty() {
            cmd.arg("--allowedTools").arg(tools);
        }
        if let Some(system) = &request.system {
            cmd.arg("--append-system-prompt").arg(system);
        }

        cmd
    }
}

#[async_trait]
impl Session for ClaudeSession {
    fn name(&self) -> &'static str {
        "claude_cli"
    }

    async fn infer(&self, request: &InferRequest) -> Result<ProviderOutput, ProviderError> {
        let mut cmd = self.build_command(request);
        let start = std::time::Instant::now();

        let output = tokio_timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
            .map_err(ProviderError::Io)?;

        if !output.status.success() {
            return Err(ProviderError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply = parse_envelope(&stdout)?;
        tracing::debug!(
            "{} answered in {:?}",
            request.role,
            start.elapsed()
        );

        Ok(ProviderOutput {
            reply,
            duration: start.elapsed(),
        })
    }
}

/// Resolve the configured binary, either as a path or through `PATH`
pub(crate) fn locate_binary(binary: &Path) -> Option<PathBuf> {
    let binary_str = binary.to_string_lossy();
    if binary_str.contains('/') || binary_str.contains('\\') {
        binary.exists().then(|| binary.to_path_buf())
    } else {
        which::which(binary_str.as_ref()).ok()
    }
}

/// Unwrap the CLI's `{"result": ..., "is_error": ...}` envelope.
/// Output that is not an envelope is passed through as plain text.
fn parse_envelope(stdout: &str) -> Result<Reply, ProviderError> {
    #[derive(Deserialize)]
    struct Envelope {
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        subtype: Option<String>,
    }

    match serde_json::from_str::<Envelope>(stdout.trim()) {
        Ok(envelope) if envelope.is_error => Err(ProviderError::Agent(
            envelope
                .result
                .or(envelope.subtype)
                .unwrap_or_else(|| "unspecified error".to_string()),
        )),
        Ok(envelope) => Ok(envelope.result.map(Reply::from_text).unwrap_or(Reply::Empty)),
        Err(_) => Ok(Reply::from_text(stdout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ClaudeSession {
        ClaudeSession {
            binary: PathBuf::from("/usr/bin/claude"),
            model: "sonnet".to_string(),
            max_turns: 5,
            permission_mode: "acceptEdits".to_string(),
            tools_override: None,
            api_key: None,
            working_dir: PathBuf::from("."),
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> InferRequest {
        InferRequest {
            role: "biotools-analyzer".to_string(),
            system: Some("You are an expert.".to_string()),
            prompt: "Analyze".to_string(),
            tools: vec!["Read".to_string(), "Grep".to_string()],
        }
    }

    #[test]
    fn test_envelope_result_unwrapped() {
        let reply = parse_envelope(r#"{"type":"result","result":"{\"a\":1}","is_error":false}"#)
            .unwrap();
        assert_eq!(reply, Reply::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_envelope_error_reported() {
        let err = parse_envelope(r#"{"result":"rate limited","is_error":true}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Agent(msg) if msg == "rate limited"));
    }

    #[test]
    fn test_envelope_max_turns_without_result() {
        let err = parse_envelope(r#"{"subtype":"error_max_turns","is_error":true}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Agent(msg) if msg == "error_max_turns"));
        assert_eq!(parse_envelope(r#"{"result":""}"#).unwrap(), Reply::Empty);
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(
            parse_envelope("not json at all").unwrap(),
            Reply::Text("not json at all".to_string())
        );
    }

    #[test]
    fn test_command_arguments() {
        let cmd = session().build_command(&request());
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(args[0], "-p");
        assert_eq!(args[1], "Analyze");
        assert!(args.windows(2).any(|w| w == ["--max-turns", "5"]));
        assert!(args.windows(2).any(|w| w == ["--allowedTools", "Read,Grep"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["--append-system-prompt", "You are an expert."]));
    }

    #[test]
    fn test_tools_override_wins() {
        let mut session = session();
        session.tools_override = Some(vec!["Read".to_string()]);
        let cmd = session.build_command(&request());
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert!(args.windows(2).any(|w| w == ["--allowedTools", "Read"]));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let config = AgentConfig {
            binary: PathBuf::from("/nonexistent/claude"),
            ..AgentConfig::default()
        };
        let err = ClaudeSession::new(&config, Path::new(".")).err().unwrap();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
