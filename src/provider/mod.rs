mod chat;
mod claude;

use chat::ChatSession;
use claude::ClaudeSession;
pub(crate) use claude::locate_binary;

use crate::config::{Backend, Config};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// One inference call issued on behalf of an extraction role
#[derive(Debug, Clone)]
pub struct InferRequest {
    pub role: String,
    pub system: Option<String>,
    pub prompt: String,
    /// Tools the agent may use for this role; ignored by plain chat backends
    pub tools: Vec<String>,
}

/// Backend reply, normalized at the transport boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Empty,
}

impl Reply {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Reply::Empty
        } else {
            Reply::Text(text)
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Empty => None,
        }
    }
}

#[derive(Debug)]
pub struct ProviderOutput {
    pub reply: Reply,
    pub duration: Duration,
}

/// A connection context shared by every extraction of one analysis run.
/// Implementations must tolerate concurrent `infer` calls.
#[async_trait]
pub trait Session: Send + Sync {
    fn name(&self) -> &'static str;

    async fn infer(&self, request: &InferRequest) -> Result<ProviderOutput, ProviderError>;
}

/// Open a session for the configured backend.
///
/// `Auto` prefers the agent CLI when its binary resolves, then the chat
/// API when a key is configured.
pub async fn connect(
    config: &Config,
    workdir: &Path,
) -> Result<Arc<dyn Session>, ProviderError> {
    match resolve_backend(config) {
        Some(Backend::Agent) => {
            let session = ClaudeSession::new(&config.agent, workdir)?;
            tracing::info!("Using agent backend ({})", session.binary().display());
            Ok(Arc::new(session))
        }
        Some(Backend::Chat) => {
            let session = ChatSession::new(&config.chat)?;
            tracing::info!("Using chat backend ({})", config.chat.model);
            Ok(Arc::new(session))
        }
        _ => Err(ProviderError::Unavailable(
            "no agent CLI found and no chat API key configured".to_string(),
        )),
    }
}

fn resolve_backend(config: &Config) -> Option<Backend> {
    match config.backend {
        Backend::Auto => {
            if claude::locate_binary(&config.agent.binary).is_some() {
                Some(Backend::Agent)
            } else if config.chat.api_key.is_some() {
                Some(Backend::Chat)
            } else {
                None
            }
        }
        explicit => Some(explicit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_normalizes_blank_text() {
        assert_eq!(Reply::from_text("  \n"), Reply::Empty);
        assert_eq!(Reply::from_text("{}").as_text(), Some("{}"));
    }

    #[test]
    fn test_auto_backend_prefers_chat_without_binary() {
        let mut config = Config::default();
        config.agent.binary = "/nonexistent/claude-binary".into();
        assert_eq!(resolve_backend(&config), None);

        config.chat.api_key = Some("sk-test".to_string());
        assert_eq!(resolve_backend(&config), Some(Backend::Chat));
    }

    #[tokio::test]
    async fn test_connect_unavailable_without_any_backend() {
        let mut config = Config::default();
        config.agent.binary = "/nonexistent/claude-binary".into();
        let err = connect(&config, Path::new(".")).await.err().unwrap();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_explicit_chat_backend_requires_key() {
        let mut config = Config::default();
        config.backend = Backend::Chat;
        let err = connect(&config, Path::new(".")).await.err().unwrap();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
