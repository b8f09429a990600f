//! Model clients.
//!
//! The conversation runtime only sees [`LlmClient`]. Two wire formats are
//! supported: OpenAI-style chat completions (OpenAI and Ollama) and the
//! Anthropic messages API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brewbot_core::config::{LlmConfig, LlmProvider};
use brewbot_core::{Message, Role};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self { temperature: 0.4, max_tokens: 512 }
    }
}

impl From<&LlmConfig> for CompletionOptions {
    fn from(config: &LlmConfig) -> Self {
        Self { temperature: config.temperature, max_tokens: config.max_tokens }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("model request timed out after {0:?}")]
    Timeout(Duration),
    #[error("model transport failed: {0}")]
    Transport(String),
    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response was malformed: {0}")]
    MalformedResponse(String),
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}

#[derive(Clone, Debug)]
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatibleClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: trim_base_url(base_url.into()),
            api_key,
            model: model.into(),
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&chat_completions_body(&self.model, messages, options));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let body = send(request, self.timeout).await?;
        parse_chat_completion(&body)
    }
}

#[derive(Clone, Debug)]
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    timeout: Duration,
}

impl AnthropicClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: trim_base_url(base_url.into()),
            api_key,
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .timeout(self.timeout)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&anthropic_messages_body(&self.model, messages, options));

        let body = send(request, self.timeout).await?;
        parse_anthropic_message(&body)
    }
}

/// Builds the configured provider's client.
pub fn client_from_config(config: &LlmConfig) -> Arc<dyn LlmClient> {
    client_for_model(config, &config.model)
}

/// Same as [`client_from_config`] with a different model name.
pub fn client_for_model(config: &LlmConfig, model: &str) -> Arc<dyn LlmClient> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiCompatibleClient::new(
            config.base_url.clone().unwrap_or_else(|| "https://api.openai.com".to_string()),
            config.api_key.clone(),
            model,
            timeout,
        )),
        LlmProvider::Ollama => Arc::new(OpenAiCompatibleClient::new(
            config.base_url.clone().unwrap_or_else(|| "http://localhost:11434".to_string()),
            None,
            model,
            timeout,
        )),
        LlmProvider::Anthropic => Arc::new(AnthropicClient::new(
            config.base_url.clone().unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            config.api_key.clone().unwrap_or_else(|| SecretString::from(String::new())),
            model,
            timeout,
        )),
    }
}

async fn send(request: reqwest::RequestBuilder, timeout: Duration) -> Result<Value, LlmError> {
    let result = exchange(request, timeout).await;
    if let Err(error) = &result {
        warn!(event_name = "llm.request.failed", error = %error, "model request failed");
    }
    result
}

async fn exchange(request: reqwest::RequestBuilder, timeout: Duration) -> Result<Value, LlmError> {
    let response = request.send().await.map_err(|error| transport_error(error, timeout))?;
    let status = response.status();
    let text = response.text().await.map_err(|error| transport_error(error, timeout))?;

    if !status.is_success() {
        return Err(LlmError::Status { status: status.as_u16(), body: truncate(&text) });
    }

    serde_json::from_str::<Value>(&text)
        .map_err(|error| LlmError::MalformedResponse(format!("invalid json: {error}")))
}

fn transport_error(error: reqwest::Error, timeout: Duration) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(timeout)
    } else {
        LlmError::Transport(error.to_string())
    }
}

fn chat_completions_body(model: &str, messages: &[Message], options: &CompletionOptions) -> Value {
    let messages = messages
        .iter()
        .map(|message| json!({ "role": message.role.as_str(), "content": message.content }))
        .collect::<Vec<_>>();

    json!({
        "model": model,
        "messages": messages,
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
        "stream": false,
    })
}

fn anthropic_messages_body(model: &str, messages: &[Message], options: &CompletionOptions) -> Value {
    let system = messages
        .iter()
        .filter(|message| message.role == Role::System)
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let turns = messages
        .iter()
        .filter(|message| message.role != Role::System)
        .map(|message| json!({ "role": message.role.as_str(), "content": message.content }))
        .collect::<Vec<_>>();

    let mut body = json!({
        "model": model,
        "messages": turns,
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    });
    if !system.is_empty() {
        body["system"] = Value::String(system);
    }
    body
}

fn parse_chat_completion(body: &Value) -> Result<String, LlmError> {
    let content = body
        .pointer("/choices/0/message/content")
        .ok_or_else(|| LlmError::MalformedResponse("missing choices[0].message.content".into()))?;
    let text = content
        .as_str()
        .ok_or_else(|| LlmError::MalformedResponse("message content is not a string".into()))?;
    non_empty(text)
}

fn parse_anthropic_message(body: &Value) -> Result<String, LlmError> {
    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::MalformedResponse("missing content blocks".into()))?;
    let text = blocks
        .iter()
        .find(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::MalformedResponse("no text content block".into()))?;
    non_empty(text)
}

fn non_empty(text: &str) -> Result<String, LlmError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(trimmed.to_string())
}

fn trim_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn truncate(text: &str) -> String {
    text.chars().take(ERROR_BODY_LIMIT).collect()
}
