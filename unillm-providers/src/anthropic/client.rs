//! Anthropic vendor clients
//!
//! The provider talks to Anthropic only through [`AnthropicClient`] and
//! [`AsyncAnthropicClient`]. The HTTP implementations here are the defaults;
//! tests and callers with special transport needs inject their own.

use super::config::AnthropicConfig;
use super::converter::{AnthropicCompletion, AnthropicPayload};
use super::stream::decode_event;
use super::PROVIDER;
use crate::http::{AsyncTransport, BlockingTransport};
use crate::stream_utils::SseChunks;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use unillm_core::{ChunkIter, ChunkStream, Result};

/// Blocking Anthropic client
pub trait AnthropicClient: Send + Sync {
    /// Run one completion
    fn complete(&self, model: &str, payload: &AnthropicPayload) -> Result<AnthropicCompletion>;

    /// Open a streaming completion
    fn complete_stream(
        &self,
        model: &str,
        payload: &AnthropicPayload,
    ) -> Result<ChunkIter<AnthropicCompletion>>;

    /// Count the tokens of `text` with the vendor's tokenizer
    fn count_tokens(&self, model: &str, text: &str) -> Result<usize>;
}

/// Async Anthropic client
#[async_trait]
pub trait AsyncAnthropicClient: Send + Sync {
    /// Run one completion
    async fn complete(&self, model: &str, payload: &AnthropicPayload)
        -> Result<AnthropicCompletion>;

    /// Open a streaming completion
    async fn complete_stream(
        &self,
        model: &str,
        payload: &AnthropicPayload,
    ) -> Result<ChunkStream<AnthropicCompletion>>;
}

#[derive(Deserialize)]
struct TokenCount {
    input_tokens: usize,
}

/// Blocking HTTP client for the Anthropic API
#[derive(Debug)]
pub struct HttpAnthropicClient {
    complete_url: String,
    count_tokens_url: String,
    transport: BlockingTransport,
}

impl HttpAnthropicClient {
    /// Create a client from a configuration
    pub fn new(config: &AnthropicConfig) -> Result<Self> {
        let headers = config.headers(&config.client_options)?;
        Ok(Self {
            complete_url: config.endpoint("/v1/complete"),
            count_tokens_url: config.endpoint("/v1/messages/count_tokens"),
            transport: BlockingTransport::new(PROVIDER, headers, config.client_options.timeout),
        })
    }
}

impl AnthropicClient for HttpAnthropicClient {
    fn complete(&self, model: &str, payload: &AnthropicPayload) -> Result<AnthropicCompletion> {
        self.transport
            .post_json(&self.complete_url, &payload.to_body(model))
    }

    fn complete_stream(
        &self,
        model: &str,
        payload: &AnthropicPayload,
    ) -> Result<ChunkIter<AnthropicCompletion>> {
        let events = self
            .transport
            .post_sse(&self.complete_url, &payload.to_body(model))?;
        Ok(Box::new(SseChunks::new(events, decode_event)))
    }

    fn count_tokens(&self, model: &str, text: &str) -> Result<usize> {
        let body = json!({
            "model": model,
            "messages": [{"role": "user", "content": text}],
        });
        let count: TokenCount = self.transport.post_json(&self.count_tokens_url, &body)?;
        Ok(count.input_tokens)
    }
}

/// Async HTTP client for the Anthropic API
#[derive(Debug, Clone)]
pub struct AsyncHttpAnthropicClient {
    complete_url: String,
    transport: AsyncTransport,
}

impl AsyncHttpAnthropicClient {
    /// Create a client from a configuration
    pub fn new(config: &AnthropicConfig) -> Result<Self> {
        let options = &config.async_client_options;
        let headers = config.headers(options)?;
        Ok(Self {
            complete_url: config.endpoint("/v1/complete"),
            transport: AsyncTransport::new(PROVIDER, headers, options.timeout)?,
        })
    }
}

#[async_trait]
impl AsyncAnthropicClient for AsyncHttpAnthropicClient {
    async fn complete(
        &self,
        model: &str,
        payload: &AnthropicPayload,
    ) -> Result<AnthropicCompletion> {
        self.transport
            .post_json(&self.complete_url, &payload.to_body(model))
            .await
    }

    async fn complete_stream(
        &self,
        model: &str,
        payload: &AnthropicPayload,
    ) -> Result<ChunkStream<AnthropicCompletion>> {
        let events = self
            .transport
            .post_event_stream(&self.complete_url, &payload.to_body(model))
            .await?;
        Ok(Box::pin(SseChunks::new(events, decode_event)))
    }
}
