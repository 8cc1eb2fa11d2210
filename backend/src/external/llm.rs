//! Text-generation backends used for farmer advisories
//!
//! Two providers are supported: a local Ollama server and the hosted Groq
//! API (OpenAI-compatible chat completions).

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;
use crate::error::AppError;

/// Failures of a single completion request
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Groq API key is not configured")]
    MissingApiKey,

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse LLM response: {0}")]
    Parse(String),
}

/// A backend that turns a prompt into advisory text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Configured provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Ollama,
    Groq,
}

impl FromStr for LlmProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "groq" => Ok(LlmProvider::Groq),
            other => Err(AppError::UnsupportedProvider(other.to_string())),
        }
    }
}

fn http_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!("Failed to build LLM HTTP client, using defaults: {}", e);
        Client::new()
    })
}

fn non_empty(text: &str) -> Result<String, LlmError> {
    let text = text.trim();
    if text.is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(text.to_string())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Status { status, body })
}

/// Local Ollama server client
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;

        let data: OllamaGenerateResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        non_empty(&data.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Groq hosted inference client
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

/// Message content is either plain text or a list of typed parts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text(String),
    Object {
        #[serde(default, alias = "content")]
        text: Option<String>,
    },
}

impl ContentPart {
    fn into_text(self) -> Option<String> {
        match self {
            ContentPart::Text(text) => Some(text),
            ContentPart::Object { text } => text,
        }
    }
}

impl MessageContent {
    /// Parts are trimmed, blanks dropped and the rest joined line by line
    fn into_text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .into_iter()
                .filter_map(ContentPart::into_text)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl GroqClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let data: ChatCompletionResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let text = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(MessageContent::into_text)
            .unwrap_or_default();

        non_empty(&text)
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}

/// Provider selected once from configuration
#[derive(Clone)]
pub enum LlmBackend {
    Local(OllamaClient),
    Hosted(GroqClient),
}

impl LlmBackend {
    pub fn from_config(config: &LlmConfig) -> Result<Self, AppError> {
        let timeout = config.timeout();
        let backend = match config.provider.parse::<LlmProvider>()? {
            LlmProvider::Ollama => LlmBackend::Local(OllamaClient::new(
                &config.ollama.base_url,
                &config.ollama.model,
                timeout,
            )),
            LlmProvider::Groq => LlmBackend::Hosted(GroqClient::new(
                &config.groq.base_url,
                &config.groq.model,
                config.groq.api_key.clone(),
                timeout,
            )),
        };
        tracing::info!("Advisory backend: {}", backend.name());
        Ok(backend)
    }
}

#[async_trait]
impl TextGenerator for LlmBackend {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, LlmError> {
        match self {
            LlmBackend::Local(client) => client.complete(prompt, timeout).await,
            LlmBackend::Hosted(client) => client.complete(prompt, timeout).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            LlmBackend::Local(client) => client.name(),
            LlmBackend::Hosted(client) => client.name(),
        }
    }
}
