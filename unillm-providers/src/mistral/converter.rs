//! Conversion between Unillm requests and Mistral API types

use super::config::MODELS;
use super::PROVIDER;
use crate::traits::RequestNormalizer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use unillm_core::types::model::lookup;
use unillm_core::{Error, GenerationRequest, Message, ModelInfo, Result, Usage};

/// Payload fields set by the normalizer
const OWNED_KEYS: &[&str] = &["messages", "temperature", "max_tokens", "random_seed"];

/// Passthrough keys that would smuggle client stop sequences into the body
const STOP_KEYS: &[&str] = &["stop", "stop_sequences"];

/// Normalized arguments of one `/v1/chat/completions` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MistralPayload {
    /// System message, history and the new prompt, in that order
    pub messages: Vec<Message>,
    /// Sampling temperature
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Seed for deterministic sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
    /// Whether the response is streamed
    pub stream: bool,
    /// Passthrough parameters (e.g. `safe_prompt`), merged last into the body
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl MistralPayload {
    /// The JSON request body for `model`
    pub fn to_body(&self, model: &str) -> Result<Value> {
        let mut body = Map::new();
        body.insert("model".into(), Value::from(model));
        body.insert("messages".into(), serde_json::to_value(&self.messages)?);
        body.insert("temperature".into(), Value::from(self.temperature));
        body.insert("max_tokens".into(), Value::from(self.max_tokens));
        if let Some(seed) = self.random_seed {
            body.insert("random_seed".into(), Value::from(seed));
        }
        body.insert("stream".into(), Value::from(self.stream));
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }
        Ok(Value::Object(body))
    }
}

/// Token usage as reported by Mistral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MistralUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<MistralUsage> for Usage {
    fn from(usage: MistralUsage) -> Self {
        Usage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

/// A message in a chat completion response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    /// Role of the author
    #[serde(default)]
    pub role: Option<String>,
    /// Message text
    #[serde(default)]
    pub content: Option<String>,
}

/// One choice of a chat completion response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatChoice {
    /// Position of the choice
    #[serde(default)]
    pub index: u32,
    /// The generated message
    pub message: ChatMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A `/v1/chat/completions` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Model that served the request
    #[serde(default)]
    pub model: Option<String>,
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<MistralUsage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice
    pub fn text(&self) -> Result<&str> {
        let choice = self
            .choices
            .first()
            .ok_or_else(|| Error::vendor(PROVIDER, "Response contained no choices"))?;
        Ok(choice.message.content.as_deref().unwrap_or_default())
    }
}

/// Builds `/v1/chat/completions` payloads for one model
#[derive(Debug, Clone)]
pub struct MistralNormalizer {
    model: String,
    info: Option<&'static ModelInfo>,
}

impl MistralNormalizer {
    /// Create a normalizer for `model`
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let info = lookup(MODELS, &model);
        if info.is_none() {
            warn!(provider = PROVIDER, model = %model, "Unknown model, pricing unavailable");
        }
        Self { model, info }
    }

    /// The model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Table entry of the model, if known
    pub fn info(&self) -> Option<&'static ModelInfo> {
        self.info
    }

    fn unsupported(&self, feature: &'static str) -> Error {
        Error::UnsupportedFeature {
            provider: PROVIDER,
            model: self.model.clone(),
            feature,
        }
    }
}

impl RequestNormalizer for MistralNormalizer {
    type Payload = MistralPayload;

    fn normalize(&self, request: &GenerationRequest, stream: bool) -> Result<MistralPayload> {
        request.validate()?;
        request.extra_policy.check(&request.extra, OWNED_KEYS)?;
        let stop_in_extra = STOP_KEYS.iter().any(|key| request.extra.contains_key(*key));
        if stop_in_extra
            || request
                .stop_sequences
                .as_ref()
                .is_some_and(|stop| !stop.is_empty())
        {
            return Err(self.unsupported("stop sequences"));
        }
        if request.response_prefix.is_some() {
            return Err(self.unsupported("response prefix"));
        }

        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if let Some(system) = &request.system_message {
            messages.push(Message::system(system.as_str()));
        }
        messages.extend(request.history.iter().cloned());
        messages.push(Message::user(request.prompt.as_str()));

        Ok(MistralPayload {
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            random_seed: request.seed,
            stream,
            extra: request.extra.clone(),
        })
    }
}
