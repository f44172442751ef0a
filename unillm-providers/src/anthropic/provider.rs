//! Anthropic provider implementation

use super::client::{
    AnthropicClient, AsyncAnthropicClient, AsyncHttpAnthropicClient, HttpAnthropicClient,
};
use super::config::AnthropicConfig;
use super::converter::{AnthropicCompletion, AnthropicNormalizer, AnthropicPayload};
use super::PROVIDER;
use crate::builder::AnthropicBuilder;
use crate::traits::RequestNormalizer;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use unillm_core::{
    AsyncFragments, AsyncStreamCompletion, Completion, CompletionMeta, Fragments,
    GenerationRequest, LastLatency, LatencyTracker, ModelInfo, Provider, Result, StreamCompletion,
};

/// Anthropic Claude provider for text completions
///
/// # Example
///
/// ```no_run
/// use unillm_core::{GenerationRequest, Provider};
/// use unillm_providers::Anthropic;
///
/// # fn main() -> unillm_core::Result<()> {
/// let provider = Anthropic::builder("sk-ant-...").model("claude-2").build()?;
/// let request = GenerationRequest::builder("What is the capital of France?")
///     .system_message("Answer in one word.")
///     .build();
/// let completion = provider.complete(&request)?;
/// println!("{} ({:.2}s)", completion.text(), completion.meta().latency_secs());
/// # Ok(())
/// # }
/// ```
pub struct Anthropic {
    normalizer: AnthropicNormalizer,
    client: Arc<dyn AnthropicClient>,
    async_client: Arc<dyn AsyncAnthropicClient>,
    last_latency: LastLatency,
}

impl Anthropic {
    /// Create a provider with HTTP clients built from `config`
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let client = HttpAnthropicClient::new(&config)?;
        let async_client = AsyncHttpAnthropicClient::new(&config)?;
        Ok(Self::with_clients(
            config.model,
            Arc::new(client),
            Arc::new(async_client),
        ))
    }

    /// Create a provider for the default model with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(AnthropicConfig::new(api_key))
    }

    /// Create a provider configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(AnthropicConfig::default())
    }

    /// Create a provider around existing vendor clients
    pub fn with_clients(
        model: impl Into<String>,
        client: Arc<dyn AnthropicClient>,
        async_client: Arc<dyn AsyncAnthropicClient>,
    ) -> Self {
        Self {
            normalizer: AnthropicNormalizer::new(model),
            client,
            async_client,
            last_latency: LastLatency::new(),
        }
    }

    /// Create a new builder
    pub fn builder(api_key: impl Into<String>) -> AnthropicBuilder {
        AnthropicBuilder::new(api_key)
    }

    fn finish(
        &self,
        response: AnthropicCompletion,
        payload: AnthropicPayload,
        latency: Duration,
    ) -> Completion<'_, Self> {
        debug!(provider = PROVIDER, model = self.model(), ?latency, "Completion finished");
        let meta = CompletionMeta {
            latency,
            ..Default::default()
        };
        Completion::new(response.completion.trim(), payload, self, meta)
    }
}

impl RequestNormalizer for Anthropic {
    type Payload = AnthropicPayload;

    fn normalize(&self, request: &GenerationRequest, stream: bool) -> Result<AnthropicPayload> {
        self.normalizer.normalize(request, stream)
    }
}

#[async_trait]
impl Provider for Anthropic {
    type Payload = AnthropicPayload;
    type Chunk = AnthropicCompletion;

    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        self.normalizer.model()
    }

    fn model_info(&self) -> Option<&'static ModelInfo> {
        self.normalizer.info()
    }

    fn last_latency(&self) -> Option<Duration> {
        self.last_latency.get()
    }

    /// Vendor-native token count through the blocking client
    fn count_tokens(&self, content: &str) -> Result<usize> {
        if content.is_empty() {
            return Ok(0);
        }
        self.client.count_tokens(self.model(), content)
    }

    fn complete(&self, request: &GenerationRequest) -> Result<Completion<'_, Self>> {
        let payload = self.normalize(request, false)?;
        debug!(provider = PROVIDER, model = self.model(), stream = false, "Dispatching");

        let tracker = LatencyTracker::start(&self.last_latency);
        let response = self.client.complete(self.model(), &payload)?;
        let latency = tracker.finish();

        Ok(self.finish(response, payload, latency))
    }

    async fn acomplete<'a>(&'a self, request: &GenerationRequest) -> Result<Completion<'a, Self>> {
        let payload = self.normalize(request, false)?;
        debug!(provider = PROVIDER, model = self.model(), stream = false, "Dispatching");

        let tracker = LatencyTracker::start(&self.last_latency);
        let response = self.async_client.complete(self.model(), &payload).await?;
        let latency = tracker.finish();

        Ok(self.finish(response, payload, latency))
    }

    fn complete_stream(&self, request: &GenerationRequest) -> Result<StreamCompletion<'_, Self>> {
        let payload = self.normalize(request, true)?;
        debug!(provider = PROVIDER, model = self.model(), stream = true, "Dispatching");

        let tracker = LatencyTracker::start(&self.last_latency);
        let chunks = self.client.complete_stream(self.model(), &payload)?;
        let latency = tracker.finish();
        debug!(provider = PROVIDER, ?latency, "Stream opened");

        Ok(StreamCompletion::new(Fragments::new(chunks), payload, self))
    }

    async fn acomplete_stream<'a>(
        &'a self,
        request: &GenerationRequest,
    ) -> Result<AsyncStreamCompletion<'a, Self>> {
        let payload = self.normalize(request, true)?;
        debug!(provider = PROVIDER, model = self.model(), stream = true, "Dispatching");

        let tracker = LatencyTracker::start(&self.last_latency);
        let chunks = self
            .async_client
            .complete_stream(self.model(), &payload)
            .await?;
        let latency = tracker.finish();
        debug!(provider = PROVIDER, ?latency, "Stream opened");

        Ok(AsyncStreamCompletion::new(
            AsyncFragments::new(chunks),
            payload,
            self,
        ))
    }
}

impl std::fmt::Debug for Anthropic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anthropic")
            .field("model", &self.model())
            .field("last_latency", &self.last_latency.get())
            .finish_non_exhaustive()
    }
}
