//! Anthropic provider configuration

use crate::constants::{
    ANTHROPIC_API_KEY_ENV, ANTHROPIC_API_VERSION, ANTHROPIC_DEFAULT_BASE_URL,
};
use crate::http::{create_headers, Auth, ClientOptions};
use reqwest::header::{HeaderMap, HeaderValue};
use unillm_core::{Error, ModelInfo, Result};

/// Known Anthropic models; the first entry is the default
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "claude-instant-v1.1",
        prompt_price: 1.63,
        completion_price: 5.51,
        token_limit: 9_000,
        system_message: false,
    },
    ModelInfo {
        id: "claude-instant-v1",
        prompt_price: 1.63,
        completion_price: 5.51,
        token_limit: 9_000,
        system_message: false,
    },
    ModelInfo {
        id: "claude-v1",
        prompt_price: 11.02,
        completion_price: 32.68,
        token_limit: 9_000,
        system_message: false,
    },
    ModelInfo {
        id: "claude-v1-100k",
        prompt_price: 11.02,
        completion_price: 32.68,
        token_limit: 100_000,
        system_message: false,
    },
    ModelInfo {
        id: "claude-instant-1",
        prompt_price: 1.63,
        completion_price: 5.51,
        token_limit: 100_000,
        system_message: false,
    },
    ModelInfo {
        id: "claude-instant-1.2",
        prompt_price: 1.63,
        completion_price: 5.51,
        token_limit: 100_000,
        system_message: false,
    },
    ModelInfo {
        id: "claude-2",
        prompt_price: 8.0,
        completion_price: 24.0,
        token_limit: 200_000,
        system_message: true,
    },
];

/// Configuration for the Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the Anthropic API
    pub base_url: String,
    /// Model every request is sent to
    pub model: String,
    /// Options for the blocking client
    pub client_options: ClientOptions,
    /// Options for the async client
    pub async_client_options: ClientOptions,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(ANTHROPIC_API_KEY_ENV).unwrap_or_default(),
            base_url: ANTHROPIC_DEFAULT_BASE_URL.to_string(),
            model: MODELS[0].id.to_string(),
            client_options: ClientOptions::default(),
            async_client_options: ClientOptions::default(),
        }
    }
}

impl AnthropicConfig {
    /// Create a new configuration with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the blocking client options
    pub fn with_client_options(mut self, options: ClientOptions) -> Self {
        self.client_options = options;
        self
    }

    /// Set the async client options
    pub fn with_async_client_options(mut self, options: ClientOptions) -> Self {
        self.async_client_options = options;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Create Anthropic-specific headers
    pub(crate) fn headers(&self, options: &ClientOptions) -> Result<HeaderMap> {
        if self.api_key.is_empty() {
            return Err(Error::Configuration(format!(
                "Anthropic API key is missing; pass one or set {ANTHROPIC_API_KEY_ENV}"
            )));
        }
        let mut headers = create_headers(Auth::Header("x-api-key", &self.api_key), &options.headers)?;
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        Ok(headers)
    }
}
