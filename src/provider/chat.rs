use super::{InferRequest, ProviderOutput, Reply, Session};
use crate::config::ChatConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible chat completions backend
pub struct ChatSession {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    extra_body: serde_json::Map<String, serde_json::Value>,
}

impl ChatSession {
    pub fn new(config: &ChatConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ProviderError::Unavailable("chat API key is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            extra_body: config.extra_body.clone(),
        })
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let value = format!("Bearer {}", self.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value)
                .map_err(|e| ProviderError::Unavailable(format!("invalid API key: {}", e)))?,
        );
        Ok(headers)
    }

    fn body(&self, request: &InferRequest) -> Result<serde_json::Value, ProviderError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut value = serde_json::to_value(body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        if let Some(object) = value.as_object_mut() {
            for (key, extra) in &self.extra_body {
                object.insert(key.clone(), extra.clone());
            }
        }
        Ok(value)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Session for ChatSession {
    fn name(&self) -> &'static str {
        "chat_completions"
    }

    async fn infer(&self, request: &InferRequest) -> Result<ProviderOutput, ProviderError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&self.body(request)?)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(start.elapsed())
                } else {
                    ProviderError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(Reply::from_text)
            .unwrap_or(Reply::Empty);

        Ok(ProviderOutput {
            reply,
            duration: start.elapsed(),
        })
    }
}
