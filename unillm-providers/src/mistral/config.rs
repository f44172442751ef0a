//! Mistral provider configuration

use crate::constants::{MISTRAL_API_KEY_ENV, MISTRAL_DEFAULT_BASE_URL};
use crate::http::{create_headers, Auth, ClientOptions};
use reqwest::header::HeaderMap;
use unillm_core::{Error, ModelInfo, Result};

/// Known Mistral models; the first entry is the default
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "mistral-tiny",
        prompt_price: 0.14,
        completion_price: 0.42,
        token_limit: 32_000,
        system_message: true,
    },
    ModelInfo {
        id: "mistral-small",
        prompt_price: 0.6,
        completion_price: 1.8,
        token_limit: 32_000,
        system_message: true,
    },
    ModelInfo {
        id: "mistral-medium",
        prompt_price: 2.5,
        completion_price: 7.5,
        token_limit: 32_000,
        system_message: true,
    },
];

/// Configuration for the Mistral provider
#[derive(Debug, Clone)]
pub struct MistralConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the Mistral API
    pub base_url: String,
    /// Model every request is sent to
    pub model: String,
    /// Options for the blocking client
    pub client_options: ClientOptions,
    /// Options for the async client
    pub async_client_options: ClientOptions,
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(MISTRAL_API_KEY_ENV).unwrap_or_default(),
            base_url: MISTRAL_DEFAULT_BASE_URL.to_string(),
            model: MODELS[0].id.to_string(),
            client_options: ClientOptions::default(),
            async_client_options: ClientOptions::default(),
        }
    }
}

impl MistralConfig {
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

    pub(crate) fn headers(&self, options: &ClientOptions) -> Result<HeaderMap> {
        if self.api_key.is_empty() {
            return Err(Error::Configuration(format!(
                "Mistral API key is missing; pass one or set {MISTRAL_API_KEY_ENV}"
            )));
        }
        create_headers(Auth::Bearer(&self.api_key), &options.headers)
    }
}
