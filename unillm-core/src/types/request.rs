//! Vendor-agnostic generation requests

use crate::error::Error;
use crate::types::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Default number of tokens to generate when the caller does not say
pub const DEFAULT_MAX_TOKENS: u32 = 300;

/// Keys no passthrough parameter may ever replace
pub const LOCKED_KEYS: &[&str] = &["model", "stream"];

/// How passthrough parameters interact with fields set by a normalizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraPolicy {
    /// A passthrough key naming a normalizer-owned field is an error
    #[default]
    Reject,
    /// Passthrough keys replace normalizer-owned fields (last write wins),
    /// except the keys in [`LOCKED_KEYS`]
    Override,
}

impl ExtraPolicy {
    /// Check `extra` against the keys a normalizer sets itself
    pub fn check(self, extra: &Map<String, Value>, owned: &[&str]) -> Result<(), Error> {
        for key in extra.keys() {
            let locked = LOCKED_KEYS.contains(&key.as_str());
            let owned = owned.contains(&key.as_str());
            if locked || (owned && self == ExtraPolicy::Reject) {
                return Err(Error::ParameterConflict { key: key.clone() });
            }
        }
        Ok(())
    }
}

/// A single logical completion request, independent of any vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The new user prompt
    pub prompt: String,
    /// Prior conversation, oldest first
    pub history: Vec<Message>,
    /// Sampling temperature
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Client-side stop sequences
    pub stop_sequences: Option<Vec<String>>,
    /// System instructions
    pub system_message: Option<String>,
    /// Prefix the model's answer should start from
    pub response_prefix: Option<String>,
    /// Random seed for deterministic sampling
    pub seed: Option<u64>,
    /// Vendor options passed through verbatim
    pub extra: Map<String, Value>,
    /// Collision policy for `extra`
    pub extra_policy: ExtraPolicy,
}

impl GenerationRequest {
    /// Create a request with just a prompt and default parameters
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            stop_sequences: None,
            system_message: None,
            response_prefix: None,
            seed: None,
            extra: Map::new(),
            extra_policy: ExtraPolicy::default(),
        }
    }

    /// Create a new request builder
    pub fn builder(prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            request: Self::new(prompt),
        }
    }

    /// Check the parameters every backend relies on
    pub fn validate(&self) -> Result<(), Error> {
        self.check().map_err(Error::from)
    }

    fn check(&self) -> Result<(), BuildError> {
        if self.max_tokens == 0 {
            return Err(BuildError::ZeroMaxTokens);
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(BuildError::InvalidTemperature(self.temperature));
        }
        Ok(())
    }
}

/// Builder for [`GenerationRequest`]
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    request: GenerationRequest,
}

impl GenerationRequestBuilder {
    /// Append one history message
    pub fn message(mut self, message: Message) -> Self {
        self.request.history.push(message);
        self
    }

    /// Append several history messages
    pub fn history(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.request.history.extend(messages);
        self
    }

    /// Set temperature
    pub fn temperature(mut self, temp: f64) -> Self {
        self.request.temperature = temp;
        self
    }

    /// Set max tokens
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.request.max_tokens = tokens;
        self
    }

    /// Set stop sequences
    pub fn stop(mut self, sequences: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.request.stop_sequences = Some(sequences.into_iter().map(Into::into).collect());
        self
    }

    /// Set the system message
    pub fn system_message(mut self, text: impl Into<String>) -> Self {
        self.request.system_message = Some(text.into());
        self
    }

    /// Set the prefix the answer should continue from
    pub fn response_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.request.response_prefix = Some(prefix.into());
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.request.seed = Some(seed);
        self
    }

    /// Add a passthrough parameter
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.extra.insert(key.into(), value.into());
        self
    }

    /// Set the passthrough collision policy
    pub fn extra_policy(mut self, policy: ExtraPolicy) -> Self {
        self.request.extra_policy = policy;
        self
    }

    /// Build the request
    pub fn build(self) -> GenerationRequest {
        self.request
    }

    /// Try to build the request, returning an error if validation fails
    pub fn try_build(self) -> Result<GenerationRequest, BuildError> {
        self.request.check()?;
        Ok(self.request)
    }
}

/// Errors that can occur when building a request
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    /// `max_tokens` must be positive
    #[error("max_tokens must be a positive integer")]
    ZeroMaxTokens,
    /// Temperature must be a finite, non-negative number
    #[error("temperature must be finite and non-negative, got {0}")]
    InvalidTemperature(f64),
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::Validation(err.to_string())
    }
}
