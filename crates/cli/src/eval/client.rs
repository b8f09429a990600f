use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("bot request timed out after {0:?}")]
    Timeout(Duration),
    #[error("bot request failed: {0}")]
    Transport(String),
    #[error("bot returned status {0}")]
    Status(u16),
    #[error("bot response was malformed: {0}")]
    Malformed(String),
}

/// The system under evaluation: one question in, one reply out.
#[async_trait]
pub trait BotClient: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, BotError>;
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

/// Talks to a running server's `/chat` endpoint. Every question starts a
/// fresh session.
#[derive(Clone, Debug)]
pub struct HttpBotClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBotClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: Client::new(), base_url, timeout }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

#[async_trait]
impl BotClient for HttpBotClient {
    async fn ask(&self, question: &str) -> Result<String, BotError> {
        let response = self
            .client
            .post(self.chat_url())
            .timeout(self.timeout)
            .json(&json!({ "message": question }))
            .send()
            .await
            .map_err(|error| self.transport_error(error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Status(status.as_u16()));
        }

        let reply = response
            .json::<ChatReply>()
            .await
            .map_err(|error| BotError::Malformed(error.to_string()))?;
        Ok(reply.response)
    }
}

impl HttpBotClient {
    fn transport_error(&self, error: reqwest::Error) -> BotError {
        if error.is_timeout() {
            BotError::Timeout(self.timeout)
        } else {
            BotError::Transport(error.to_string())
        }
    }
}
