//! HTTP implementations of the core capability traits.
//!
//! One client per provider (OpenAI-compatible, Anthropic, Ollama), selected
//! from [`LlmConfig`]. Every request carries the configured timeout and is
//! attempted exactly once; retries are the pipeline's job to avoid, not
//! ours to add.

mod anthropic;
mod ollama;
mod openai;

use std::sync::Arc;

use cotiza_core::config::{LlmConfig, LlmProvider};
use cotiza_core::{Embedder, TextGenerator};
use tracing::info;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Capability handles wired from configuration. Either handle may be
/// absent; the pipeline falls back to its local tiers.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub embedder: Option<Arc<dyn Embedder>>,
}

impl Capabilities {
    /// Build provider clients from config. A disabled LLM section yields
    /// empty capabilities (fully local operation).
    pub fn from_config(config: &LlmConfig) -> Self {
        if !config.enabled {
            info!("llm disabled; running with local fallback tiers only");
            return Self::default();
        }

        match config.provider {
            LlmProvider::OpenAi => {
                let client = Arc::new(OpenAiClient::from_config(config));
                Self {
                    generator: Some(Arc::clone(&client) as Arc<dyn TextGenerator>),
                    embedder: Some(client as Arc<dyn Embedder>),
                }
            }
            LlmProvider::Anthropic => {
                // Anthropic has no embeddings endpoint; history matching
                // falls back to the bag-of-words vector.
                let client = Arc::new(AnthropicClient::from_config(config));
                Self { generator: Some(client as Arc<dyn TextGenerator>), embedder: None }
            }
            LlmProvider::Ollama => {
                let client = Arc::new(OllamaClient::from_config(config));
                Self {
                    generator: Some(Arc::clone(&client) as Arc<dyn TextGenerator>),
                    embedder: Some(client as Arc<dyn Embedder>),
                }
            }
        }
    }
}

pub(crate) fn map_request_error(
    error: reqwest::Error,
    timeout_secs: u64,
) -> cotiza_core::CapabilityError {
    if error.is_timeout() {
        cotiza_core::CapabilityError::Timeout(timeout_secs)
    } else {
        cotiza_core::CapabilityError::Unavailable(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use cotiza_core::config::{LlmConfig, LlmProvider};

    use super::Capabilities;

    fn config(provider: LlmProvider, enabled: bool) -> LlmConfig {
        LlmConfig {
            provider,
            enabled,
            api_key: Some("sk-test".to_owned().into()),
            base_url: Some("http://localhost:11434".to_owned()),
            model: "test-model".to_owned(),
            embedding_model: "test-embed".to_owned(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn disabled_config_yields_no_capabilities() {
        let capabilities = Capabilities::from_config(&config(LlmProvider::OpenAi, false));
        assert!(capabilities.generator.is_none());
        assert!(capabilities.embedder.is_none());
    }

    #[test]
    fn anthropic_has_no_embedder() {
        let capabilities = Capabilities::from_config(&config(LlmProvider::Anthropic, true));
        assert!(capabilities.generator.is_some());
        assert!(capabilities.embedder.is_none());
    }

    #[test]
    fn openai_and_ollama_carry_both_capabilities() {
        for provider in [LlmProvider::OpenAi, LlmProvider::Ollama] {
            let capabilities = Capabilities::from_config(&config(provider, true));
            assert!(capabilities.generator.is_some());
            assert!(capabilities.embedder.is_some());
        }
    }
}
