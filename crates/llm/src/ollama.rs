//! Ollama backend (`/api/chat` + `/api/embed`).

use std::time::Duration;

use async_trait::async_trait;
use cotiza_core::config::LlmConfig;
use cotiza_core::{CapabilityError, CompletionRequest, Embedder, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    embedding_model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("http client");
        Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|error| crate::map_request_error(error, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Unavailable(format!(
                "ollama chat returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| CapabilityError::Malformed(error.to_string()))?;

        if parsed.message.content.trim().is_empty() {
            return Err(CapabilityError::Malformed("empty completion".to_string()));
        }
        debug!(chars = parsed.message.content.len(), "ollama completion received");
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        let body = EmbedRequest { model: &self.embedding_model, input: text };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|error| crate::map_request_error(error, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Unavailable(format!(
                "ollama embed returned {}",
                response.status()
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|error| CapabilityError::Malformed(error.to_string()))?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| CapabilityError::Malformed("empty embedding".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}
