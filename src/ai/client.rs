use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ServiceConfig;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid response from upstream")]
    InvalidResponse,

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for OracleError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::Transport(e)
        }
    }
}

/// A single-turn completion endpoint used as the judge.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send `prompt` as the only user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// Longest upstream error body kept for logs.
const MAX_ERROR_BODY: usize = 512;

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(OracleError::Transport)?;

        Ok(Self {
            http,
            url: config.completions_url(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Oracle for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                body = crate::utils::truncate_string(&body, MAX_ERROR_BODY);
            }
            tracing::warn!(%status, "completion endpoint returned non-success status");
            return Err(OracleError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        extract_content(&bytes)
    }
}

/// Pull `choices[0].message.content` out of a raw response body.
fn extract_content(body: &[u8]) -> Result<String, OracleError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_slice(body).map_err(|_| OracleError::InvalidResponse)?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(OracleError::InvalidResponse)
}
