//! Conversion between Unillm requests and Anthropic API types

use super::config::MODELS;
use super::PROVIDER;
use crate::traits::RequestNormalizer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use unillm_core::adapter::StreamChunk;
use unillm_core::types::model::lookup;
use unillm_core::{Error, GenerationRequest, ModelInfo, Result, Role};

/// Marker opening a human turn
pub const HUMAN_PROMPT: &str = "\n\nHuman:";

/// Marker opening an assistant turn
pub const AI_PROMPT: &str = "\n\nAssistant:";

/// Payload fields set by the normalizer
const OWNED_KEYS: &[&str] = &[
    "prompt",
    "temperature",
    "max_tokens_to_sample",
    "stop_sequences",
];

// Anthropic API request types

/// Normalized arguments of one `/v1/complete` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicPayload {
    /// The whole conversation as one marked-up prompt
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens_to_sample: u32,
    /// Stop sequences, the human marker unless the caller gave some
    pub stop_sequences: Vec<String>,
    /// Whether the response is streamed
    pub stream: bool,
    /// Passthrough parameters, merged last into the request body
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl AnthropicPayload {
    /// The JSON request body for `model`
    pub fn to_body(&self, model: &str) -> Value {
        let mut body = Map::new();
        body.insert("model".into(), Value::from(model));
        body.insert("prompt".into(), Value::from(self.prompt.as_str()));
        body.insert("temperature".into(), Value::from(self.temperature));
        body.insert(
            "max_tokens_to_sample".into(),
            Value::from(self.max_tokens_to_sample),
        );
        body.insert(
            "stop_sequences".into(),
            Value::from(self.stop_sequences.clone()),
        );
        body.insert("stream".into(), Value::from(self.stream));
        for (key, value) in &self.extra {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

// Anthropic API response types

/// A `/v1/complete` response, or one `completion` event of a stream
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnthropicCompletion {
    /// Generated text; the full text in a response, a delta in a stream
    pub completion: String,
    /// Why generation stopped, once it has
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Model that served the request
    #[serde(default)]
    pub model: Option<String>,
}

impl StreamChunk for AnthropicCompletion {
    fn into_fragment(self) -> Option<String> {
        Some(self.completion)
    }
}

/// Builds `/v1/complete` payloads for one model
#[derive(Debug, Clone)]
pub struct AnthropicNormalizer {
    model: String,
    info: Option<&'static ModelInfo>,
}

impl AnthropicNormalizer {
    /// Create a normalizer for `model`
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        let info = lookup(MODELS, &model);
        if info.is_none() {
            warn!(
                provider = PROVIDER,
                model = %model,
                "Unknown model, pricing and system message unavailable"
            );
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

impl RequestNormalizer for AnthropicNormalizer {
    type Payload = AnthropicPayload;

    fn normalize(&self, request: &GenerationRequest, stream: bool) -> Result<AnthropicPayload> {
        request.validate()?;
        request.extra_policy.check(&request.extra, OWNED_KEYS)?;
        if request.seed.is_some() {
            return Err(self.unsupported("seed"));
        }

        if request.system_message.is_some() && !self.info.is_some_and(|info| info.system_message) {
            return Err(self.unsupported("system message"));
        }

        let mut prompt = String::new();
        for message in &request.history {
            let marker = match message.role {
                Role::User => HUMAN_PROMPT,
                Role::Assistant => AI_PROMPT,
                Role::System => {
                    return Err(Error::InvalidRole {
                        role: message.role.to_string(),
                        allowed: "user or assistant",
                    })
                }
            };
            prompt.push_str(marker);
            prompt.push_str(&message.content);
        }

        // the system text opens the new human turn, after the history
        if let Some(system) = &request.system_message {
            prompt.push_str(system.trim_end());
            prompt.push_str("\n\n");
        }
        prompt.push_str(HUMAN_PROMPT);
        prompt.push_str(&request.prompt);
        prompt.push_str(AI_PROMPT);
        if let Some(prefix) = &request.response_prefix {
            prompt.push_str(prefix);
        }

        let stop_sequences = request
            .stop_sequences
            .clone()
            .unwrap_or_else(|| vec![HUMAN_PROMPT.to_string()]);

        Ok(AnthropicPayload {
            prompt,
            temperature: request.temperature,
            max_tokens_to_sample: request.max_tokens,
            stop_sequences,
            stream,
            extra: request.extra.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use unillm_core::{ExtraPolicy, Message};

    #[test]
    fn test_prompt_with_history_and_prefix() {
        let normalizer = AnthropicNormalizer::new("claude-instant-1");
        let request = GenerationRequest::builder("And now?")
            .message(Message::user("Hi"))
            .message(Message::assistant("Hello!"))
            .response_prefix(" Well,")
            .build();

        let payload = normalizer.normalize(&request, false).unwrap();
        assert_eq!(
            payload.prompt,
            "\n\nHuman:Hi\n\nAssistant:Hello!\n\nHuman:And now?\n\nAssistant: Well,"
        );
        assert_eq!(payload.stop_sequences, vec![HUMAN_PROMPT.to_string()]);
        assert_eq!(payload.max_tokens_to_sample, 300);
        assert!(!payload.stream);
    }

    #[test]
    fn test_system_message_follows_history() {
        let normalizer = AnthropicNormalizer::new("claude-2");
        let request = GenerationRequest::builder("Q")
            .system_message("Be terse.  \n")
            .message(Message::user("Earlier"))
            .build();

        let payload = normalizer.normalize(&request, true).unwrap();
        assert_eq!(
            payload.prompt,
            "\n\nHuman:EarlierBe terse.\n\n\n\nHuman:Q\n\nAssistant:"
        );
        assert!(payload.stream);

        let request = GenerationRequest::builder("Q").system_message("SYS").build();
        let payload = normalizer.normalize(&request, false).unwrap();
        assert_eq!(payload.prompt, "SYS\n\n\n\nHuman:Q\n\nAssistant:");
    }

    #[test]
    fn test_system_message_rejected_for_older_models() {
        let request = GenerationRequest::builder("Q").system_message("sys").build();

        for model in ["claude-v1", "claude-instant-1.2", "claude-3-unknown"] {
            let err = AnthropicNormalizer::new(model)
                .normalize(&request, false)
                .unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedFeature { feature: "system message", .. }),
                "{model}: {err}"
            );
        }
    }

    #[test]
    fn test_system_role_in_history_is_invalid() {
        let normalizer = AnthropicNormalizer::new("claude-2");
        let request = GenerationRequest::builder("Q")
            .message(Message::system("no"))
            .build();

        let err = normalizer.normalize(&request, false).unwrap_err();
        assert_eq!(err.to_string(), "Invalid role system, role must be user or assistant");
    }

    #[test]
    fn test_explicit_stop_list_replaces_default() {
        let normalizer = AnthropicNormalizer::new("claude-v1");
        let request = GenerationRequest::builder("Q").stop(["END"]).build();
        let payload = normalizer.normalize(&request, false).unwrap();
        assert_eq!(payload.stop_sequences, vec!["END".to_string()]);

        let request = GenerationRequest::builder("Q").stop(Vec::<String>::new()).build();
        let payload = normalizer.normalize(&request, false).unwrap();
        assert!(payload.stop_sequences.is_empty());
    }

    #[test]
    fn test_seed_is_unsupported() {
        let request = GenerationRequest::builder("Q").seed(7).build();
        let err = AnthropicNormalizer::new("claude-2")
            .normalize(&request, false)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { feature: "seed", .. }));
    }

    #[test]
    fn test_extra_collisions() {
        let normalizer = AnthropicNormalizer::new("claude-2");

        let request = GenerationRequest::builder("Q")
            .extra("max_tokens_to_sample", 50)
            .build();
        let err = normalizer.normalize(&request, false).unwrap_err();
        assert!(matches!(err, Error::ParameterConflict { ref key } if key == "max_tokens_to_sample"));

        let request = GenerationRequest::builder("Q")
            .extra("max_tokens_to_sample", 50)
            .extra("top_k", 5)
            .extra_policy(ExtraPolicy::Override)
            .build();
        let payload = normalizer.normalize(&request, false).unwrap();
        let body = payload.to_body("claude-2");
        assert_eq!(body["max_tokens_to_sample"], json!(50));
        assert_eq!(body["top_k"], json!(5));
        assert_eq!(body["model"], json!("claude-2"));

        let request = GenerationRequest::builder("Q")
            .extra("stream", true)
            .extra_policy(ExtraPolicy::Override)
            .build();
        assert!(matches!(
            normalizer.normalize(&request, false),
            Err(Error::ParameterConflict { .. })
        ));
    }

    #[test]
    fn test_body_shape() {
        let normalizer = AnthropicNormalizer::new("claude-instant-v1");
        let request = GenerationRequest::builder("Hello").temperature(0.5).max_tokens(20).build();
        let body = normalizer.normalize(&request, true).unwrap().to_body("claude-instant-v1");

        assert_eq!(
            body,
            json!({
                "model": "claude-instant-v1",
                "prompt": "\n\nHuman:Hello\n\nAssistant:",
                "temperature": 0.5,
                "max_tokens_to_sample": 20,
                "stop_sequences": ["\n\nHuman:"],
                "stream": true,
            })
        );
    }

    #[test]
    fn test_temperature_keeps_its_decimal_form() {
        let request = GenerationRequest::builder("Q").temperature(0.7).build();
        let body = AnthropicNormalizer::new("claude-2")
            .normalize(&request, false)
            .unwrap()
            .to_body("claude-2");
        assert_eq!(serde_json::to_string(&body["temperature"]).unwrap(), "0.7");
    }

    #[test]
    fn test_completion_deserializes_with_missing_fields() {
        let completion: AnthropicCompletion =
            serde_json::from_value(json!({"completion": " Hi"})).unwrap();
        assert_eq!(completion.stop_reason, None);
        assert_eq!(completion.into_fragment().as_deref(), Some(" Hi"));
    }
}
