//! Mistral provider implementation

use super::client::{AsyncHttpMistralClient, AsyncMistralClient, HttpMistralClient, MistralClient};
use super::config::MistralConfig;
use super::converter::{ChatCompletionResponse, MistralNormalizer, MistralPayload};
use super::stream::ChatCompletionChunk;
use super::PROVIDER;
use crate::builder::MistralBuilder;
use crate::tokens::TokenEstimator;
use crate::traits::RequestNormalizer;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use unillm_core::{
    AsyncFragments, AsyncStreamCompletion, Completion, CompletionMeta, Fragments,
    GenerationRequest, LastLatency, LatencyTracker, Message, ModelInfo, Provider, Result,
    StreamCompletion, Usage,
};

/// Mistral provider for chat completions
///
/// Token counts are estimated with the `cl100k_base` encoding, since Mistral
/// offers no counting endpoint; treat them as approximations.
///
/// # Example
///
/// ```no_run
/// use futures::StreamExt;
/// use unillm_core::{GenerationRequest, Provider};
/// use unillm_providers::Mistral;
///
/// # async fn run() -> unillm_core::Result<()> {
/// let provider = Mistral::builder("api-key").model("mistral-small").build()?;
/// let request = GenerationRequest::builder("Write a haiku about Rust").build();
///
/// let mut stream = provider.acomplete_stream(&request).await?;
/// while let Some(fragment) = stream.next().await {
///     print!("{}", fragment?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Mistral {
    normalizer: MistralNormalizer,
    client: Arc<dyn MistralClient>,
    async_client: Arc<dyn AsyncMistralClient>,
    estimator: TokenEstimator,
    last_latency: LastLatency,
}

impl Mistral {
    /// Create a provider with HTTP clients built from `config`
    pub fn new(config: MistralConfig) -> Result<Self> {
        let client = HttpMistralClient::new(&config)?;
        let async_client = AsyncHttpMistralClient::new(&config)?;
        Self::with_clients(config.model, Arc::new(client), Arc::new(async_client))
    }

    /// Create a provider for the default model with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(MistralConfig::new(api_key))
    }

    /// Create a provider configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(MistralConfig::default())
    }

    /// Create a provider around existing vendor clients
    ///
    /// Fails only if the tokenizer used for estimation cannot be loaded.
    pub fn with_clients(
        model: impl Into<String>,
        client: Arc<dyn MistralClient>,
        async_client: Arc<dyn AsyncMistralClient>,
    ) -> Result<Self> {
        Ok(Self {
            normalizer: MistralNormalizer::new(model),
            client,
            async_client,
            estimator: TokenEstimator::cl100k()?,
            last_latency: LastLatency::new(),
        })
    }

    /// Create a new builder
    pub fn builder(api_key: impl Into<String>) -> MistralBuilder {
        MistralBuilder::new(api_key)
    }

    /// Estimate the tokens of a chat message list
    ///
    /// Each message counts as its role and content plus a fixed overhead of
    /// four tokens.
    pub fn count_message_tokens(&self, messages: &[Message]) -> usize {
        self.estimator.count_messages(messages)
    }

    fn finish(
        &self,
        response: &ChatCompletionResponse,
        payload: MistralPayload,
        latency: Duration,
    ) -> Result<Completion<'_, Self>> {
        let text = response.text()?.trim();
        let usage = response.usage.map(Usage::from);
        let cost = usage.as_ref().and_then(|usage| {
            self.model_info()
                .map(|info| info.cost(usage.prompt_tokens, usage.completion_tokens))
        });
        debug!(
            provider = PROVIDER,
            model = self.model(),
            ?latency,
            prompt_tokens = usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens = usage.as_ref().map(|u| u.completion_tokens),
            "Completion finished"
        );

        let meta = CompletionMeta {
            latency,
            usage,
            cost,
            ..Default::default()
        };
        Ok(Completion::new(text, payload, self, meta))
    }
}

impl RequestNormalizer for Mistral {
    type Payload = MistralPayload;

    fn normalize(&self, request: &GenerationRequest, stream: bool) -> Result<MistralPayload> {
        self.normalizer.normalize(request, stream)
    }
}

#[async_trait]
impl Provider for Mistral {
    type Payload = MistralPayload;
    type Chunk = ChatCompletionChunk;

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

    /// Estimated with `cl100k_base`; an approximation of Mistral's tokenizer
    fn count_tokens(&self, content: &str) -> Result<usize> {
        Ok(self.estimator.count_text(content))
    }

    fn complete(&self, request: &GenerationRequest) -> Result<Completion<'_, Self>> {
        let payload = self.normalize(request, false)?;
        debug!(provider = PROVIDER, model = self.model(), stream = false, "Dispatching");

        let tracker = LatencyTracker::start(&self.last_latency);
        let response = self.client.chat(self.model(), &payload)?;
        let latency = tracker.finish();

        self.finish(&response, payload, latency)
    }

    async fn acomplete<'a>(&'a self, request: &GenerationRequest) -> Result<Completion<'a, Self>> {
        let payload = self.normalize(request, false)?;
        debug!(provider = PROVIDER, model = self.model(), stream = false, "Dispatching");

        let tracker = LatencyTracker::start(&self.last_latency);
        let response = self.async_client.chat(self.model(), &payload).await?;
        let latency = tracker.finish();

        self.finish(&response, payload, latency)
    }

    fn complete_stream(&self, request: &GenerationRequest) -> Result<StreamCompletion<'_, Self>> {
        let payload = self.normalize(request, true)?;
        debug!(provider = PROVIDER, model = self.model(), stream = true, "Dispatching");

        let tracker = LatencyTracker::start(&self.last_latency);
        let chunks = self.client.chat_stream(self.model(), &payload)?;
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
        let chunks = self.async_client.chat_stream(self.model(), &payload).await?;
        let latency = tracker.finish();
        debug!(provider = PROVIDER, ?latency, "Stream opened");

        Ok(AsyncStreamCompletion::new(
            AsyncFragments::new(chunks),
            payload,
            self,
        ))
    }
}

impl std::fmt::Debug for Mistral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mistral")
            .field("model", &self.model())
            .field("last_latency", &self.last_latency.get())
            .finish_non_exhaustive()
    }
}
