//! Builder pattern for provider construction
//!
//! The builders follow a fluent interface where every configuration method
//! returns `self` and `build()` constructs the provider. Vendor clients are
//! HTTP clients by default; `with_client` and `with_async_client` replace
//! them, which is how tests and custom transports plug in.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//! use unillm_providers::builder::{AnthropicBuilder, MistralBuilder};
//!
//! # fn main() -> unillm_core::Result<()> {
//! let anthropic = AnthropicBuilder::new("sk-ant-...")
//!     .model("claude-2")
//!     .timeout(Duration::from_secs(60))
//!     .build()?;
//!
//! let mistral = MistralBuilder::from_env()
//!     .base_url("https://mistral.internal.example.com")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::anthropic::{
    Anthropic, AnthropicClient, AnthropicConfig, AsyncAnthropicClient, AsyncHttpAnthropicClient,
    HttpAnthropicClient,
};
use crate::http::ClientOptions;
use crate::mistral::{
    AsyncHttpMistralClient, AsyncMistralClient, HttpMistralClient, Mistral, MistralClient,
    MistralConfig,
};
use std::sync::Arc;
use std::time::Duration;
use unillm_core::Result;

/// Common builder trait for all providers
///
/// This trait defines the common interface for all provider builders,
/// ensuring consistent construction patterns across different providers.
pub trait ProviderBuilder: Sized {
    /// The provider type being built
    type Provider;

    /// The blocking vendor client trait object
    type Client: ?Sized;

    /// The async vendor client trait object
    type AsyncClient: ?Sized;

    /// Set a custom blocking client
    fn with_client(self, client: Arc<Self::Client>) -> Self;

    /// Set a custom async client
    fn with_async_client(self, client: Arc<Self::AsyncClient>) -> Self;

    /// Build the provider
    ///
    /// Consumes the builder and returns the configured provider,
    /// or an error if the configuration is invalid.
    fn build(self) -> Result<Self::Provider>;
}

/// Builder for constructing Anthropic providers
#[derive(Default)]
pub struct AnthropicBuilder {
    config: AnthropicConfig,
    client: Option<Arc<dyn AnthropicClient>>,
    async_client: Option<Arc<dyn AsyncAnthropicClient>>,
}

impl AnthropicBuilder {
    /// Create a new Anthropic builder with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(AnthropicConfig::new(api_key))
    }

    /// Create a builder with the API key taken from the environment
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: AnthropicConfig) -> Self {
        Self {
            config,
            client: None,
            async_client: None,
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the timeout of both HTTP clients
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.client_options.timeout = timeout;
        self.config.async_client_options.timeout = timeout;
        self
    }

    /// Set the blocking HTTP client options
    pub fn client_options(mut self, options: ClientOptions) -> Self {
        self.config.client_options = options;
        self
    }

    /// Set the async HTTP client options
    pub fn async_client_options(mut self, options: ClientOptions) -> Self {
        self.config.async_client_options = options;
        self
    }

    /// Set a custom blocking client
    pub fn with_client(mut self, client: Arc<dyn AnthropicClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set a custom async client
    pub fn with_async_client(mut self, client: Arc<dyn AsyncAnthropicClient>) -> Self {
        self.async_client = Some(client);
        self
    }

    /// Build the Anthropic provider
    ///
    /// The API key is only required for the HTTP clients that were not
    /// replaced.
    pub fn build(self) -> Result<Anthropic> {
        let client: Arc<dyn AnthropicClient> = match self.client {
            Some(client) => client,
            None => Arc::new(HttpAnthropicClient::new(&self.config)?),
        };
        let async_client: Arc<dyn AsyncAnthropicClient> = match self.async_client {
            Some(client) => client,
            None => Arc::new(AsyncHttpAnthropicClient::new(&self.config)?),
        };
        Ok(Anthropic::with_clients(self.config.model, client, async_client))
    }
}

impl ProviderBuilder for AnthropicBuilder {
    type Provider = Anthropic;
    type Client = dyn AnthropicClient;
    type AsyncClient = dyn AsyncAnthropicClient;

    fn with_client(self, client: Arc<dyn AnthropicClient>) -> Self {
        AnthropicBuilder::with_client(self, client)
    }

    fn with_async_client(self, client: Arc<dyn AsyncAnthropicClient>) -> Self {
        AnthropicBuilder::with_async_client(self, client)
    }

    fn build(self) -> Result<Self::Provider> {
        AnthropicBuilder::build(self)
    }
}

/// Builder for constructing Mistral providers
#[derive(Default)]
pub struct MistralBuilder {
    config: MistralConfig,
    client: Option<Arc<dyn MistralClient>>,
    async_client: Option<Arc<dyn AsyncMistralClient>>,
}

impl MistralBuilder {
    /// Create a new Mistral builder with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(MistralConfig::new(api_key))
    }

    /// Create a builder with the API key taken from the environment
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: MistralConfig) -> Self {
        Self {
            config,
            client: None,
            async_client: None,
        }
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the timeout of both HTTP clients
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.client_options.timeout = timeout;
        self.config.async_client_options.timeout = timeout;
        self
    }

    /// Set the blocking HTTP client options
    pub fn client_options(mut self, options: ClientOptions) -> Self {
        self.config.client_options = options;
        self
    }

    /// Set the async HTTP client options
    pub fn async_client_options(mut self, options: ClientOptions) -> Self {
        self.config.async_client_options = options;
        self
    }

    /// Set a custom blocking client
    pub fn with_client(mut self, client: Arc<dyn MistralClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set a custom async client
    pub fn with_async_client(mut self, client: Arc<dyn AsyncMistralClient>) -> Self {
        self.async_client = Some(client);
        self
    }

    /// Build the Mistral provider
    pub fn build(self) -> Result<Mistral> {
        let client: Arc<dyn MistralClient> = match self.client {
            Some(client) => client,
            None => Arc::new(HttpMistralClient::new(&self.config)?),
        };
        let async_client: Arc<dyn AsyncMistralClient> = match self.async_client {
            Some(client) => client,
            None => Arc::new(AsyncHttpMistralClient::new(&self.config)?),
        };
        Mistral::with_clients(self.config.model, client, async_client)
    }
}

impl ProviderBuilder for MistralBuilder {
    type Provider = Mistral;
    type Client = dyn MistralClient;
    type AsyncClient = dyn AsyncMistralClient;

    fn with_client(self, client: Arc<dyn MistralClient>) -> Self {
        MistralBuilder::with_client(self, client)
    }

    fn with_async_client(self, client: Arc<dyn AsyncMistralClient>) -> Self {
        MistralBuilder::with_async_client(self, client)
    }

    fn build(self) -> Result<Self::Provider> {
        MistralBuilder::build(self)
    }
}
