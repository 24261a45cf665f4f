//! OpenAI-compatible backend (chat completions + embeddings).

use std::time::Duration;

use async_trait::async_trait;
use cotiza_core::config::LlmConfig;
use cotiza_core::{CapabilityError, CompletionRequest, Embedder, TextGenerator};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    embedding_model: String,
    timeout_secs: u64,
}

impl OpenAiClient {
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
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key.expose_secret()),
            None => request,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .authorized(self.client.post(format!("{}/chat/completions", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(|error| crate::map_request_error(error, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Unavailable(format!(
                "chat completions returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|error| CapabilityError::Malformed(error.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(CapabilityError::Malformed("empty completion".to_string()));
        }
        debug!(chars = content.len(), "completion received");
        Ok(content)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        let body = EmbeddingRequest { model: &self.embedding_model, input: text };

        let response = self
            .authorized(self.client.post(format!("{}/embeddings", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(|error| crate::map_request_error(error, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Unavailable(format!(
                "embeddings returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|error| CapabilityError::Malformed(error.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| CapabilityError::Malformed("empty embedding".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::{ChatResponse, EmbeddingResponse};

    #[test]
    fn chat_response_parses_first_choice() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "hola"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed.choices[0].message.content, "hola");
    }

    #[test]
    fn embedding_response_parses_vector() {
        let json = r#"{"data": [{"embedding": [0.1, 0.2, 0.3]}]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(parsed.data[0].embedding.len(), 3);
    }
}
