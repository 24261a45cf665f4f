//! External capability seams.
//!
//! The pipeline never talks to a model provider directly; it consumes these
//! traits and treats every failure (including timeouts) as "capability
//! unavailable", which triggers the corresponding deterministic local tier.
//! Raw model output is funneled through [`Payload`] so unchecked text never
//! reaches pricing logic.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CapabilityError;

#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self { system: system.into(), user: user.into(), temperature: 0.3, max_tokens: 700 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CapabilityError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError>;
}

/// Discriminated view of a model response: either schema-checked JSON or
/// the raw text kept for diagnostics. Callers decide what shape they need
/// and get a `CapabilityError::Malformed` when the payload does not fit.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Parsed(Value),
    Malformed(String),
}

impl Payload {
    /// Parse raw model output. Code fences and leading prose are tolerated;
    /// anything that still fails JSON parsing is kept as `Malformed`.
    pub fn parse(raw: &str) -> Payload {
        let candidate = strip_code_fence(raw.trim());
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => Payload::Parsed(value),
            Err(_) => match extract_json_span(candidate)
                .and_then(|span| serde_json::from_str::<Value>(span).ok())
            {
                Some(value) => Payload::Parsed(value),
                None => Payload::Malformed(raw.to_owned()),
            },
        }
    }

    /// A non-empty array of non-empty strings.
    pub fn string_array(self) -> Result<Vec<String>, CapabilityError> {
        let value = self.into_value()?;
        let entries = value
            .as_array()
            .ok_or_else(|| CapabilityError::Malformed("expected a JSON array".to_owned()))?;

        let strings: Vec<String> = entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_owned)
            .collect();

        if strings.is_empty() {
            return Err(CapabilityError::Malformed("array held no usable strings".to_owned()));
        }
        Ok(strings)
    }

    fn into_value(self) -> Result<Value, CapabilityError> {
        match self {
            Payload::Parsed(value) => Ok(value),
            Payload::Malformed(raw) => {
                let preview: String = raw.chars().take(120).collect();
                Err(CapabilityError::Malformed(preview))
            }
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map(str::trim_end).unwrap_or(rest)
}

fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    let open = text.as_bytes()[start];
    let close = if open == b'[' { ']' } else { '}' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Capability that is never available. Used by local-only deployments and
/// tests to force every fallback tier.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledCapability;

#[async_trait]
impl TextGenerator for DisabledCapability {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CapabilityError> {
        Err(CapabilityError::Unavailable("text generation disabled".to_owned()))
    }
}

#[async_trait]
impl Embedder for DisabledCapability {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
        Err(CapabilityError::Unavailable("embeddings disabled".to_owned()))
    }
}
