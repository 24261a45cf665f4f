//! Anthropic Messages API backend (text generation only).

use std::time::Duration;

use async_trait::async_trait;
use cotiza_core::config::LlmConfig;
use cotiza_core::{CapabilityError, CompletionRequest, TextGenerator};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    timeout_secs: u64,
}

impl AnthropicClient {
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
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError> {
        let body = MessagesRequest {
            model: &self.model,
            system: &request.system,
            messages: vec![Message { role: "user", content: &request.user }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut http = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("anthropic-version", API_VERSION)
            .json(&body);
        if let Some(key) = &self.api_key {
            http = http.header("x-api-key", key.expose_secret());
        }

        let response = http
            .send()
            .await
            .map_err(|error| crate::map_request_error(error, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Unavailable(format!(
                "messages endpoint returned {}",
                response.status()
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|error| CapabilityError::Malformed(error.to_string()))?;

        let content = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if content.trim().is_empty() {
            return Err(CapabilityError::Malformed("empty completion".to_string()));
        }
        debug!(chars = content.len(), "anthropic completion received");
        Ok(content)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::MessagesResponse;

    #[test]
    fn messages_response_joins_text_blocks() {
        let json = r#"{"content": [{"type": "text", "text": "Hola "}, {"type": "text", "text": "mundo"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(json).expect("parse");
        let joined: String =
            parsed.content.into_iter().filter_map(|block| block.text).collect();
        assert_eq!(joined, "Hola mundo");
    }
}
