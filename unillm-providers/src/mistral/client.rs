//! Mistral vendor clients

use super::config::MistralConfig;
use super::converter::{ChatCompletionResponse, MistralPayload};
use super::stream::{decode_event, ChatCompletionChunk};
use super::PROVIDER;
use crate::http::{AsyncTransport, BlockingTransport};
use crate::stream_utils::SseChunks;
use async_trait::async_trait;
use unillm_core::{ChunkIter, ChunkStream, Result};

/// Blocking Mistral client
pub trait MistralClient: Send + Sync {
    /// Run one chat completion
    fn chat(&self, model: &str, payload: &MistralPayload) -> Result<ChatCompletionResponse>;

    /// Open a streaming chat completion
    fn chat_stream(
        &self,
        model: &str,
        payload: &MistralPayload,
    ) -> Result<ChunkIter<ChatCompletionChunk>>;
}

/// Async Mistral client
#[async_trait]
pub trait AsyncMistralClient: Send + Sync {
    /// Run one chat completion
    async fn chat(&self, model: &str, payload: &MistralPayload) -> Result<ChatCompletionResponse>;

    /// Open a streaming chat completion
    async fn chat_stream(
        &self,
        model: &str,
        payload: &MistralPayload,
    ) -> Result<ChunkStream<ChatCompletionChunk>>;
}

/// Blocking HTTP client for the Mistral API
#[derive(Debug)]
pub struct HttpMistralClient {
    chat_url: String,
    transport: BlockingTransport,
}

impl HttpMistralClient {
    /// Create a client from a configuration
    pub fn new(config: &MistralConfig) -> Result<Self> {
        let headers = config.headers(&config.client_options)?;
        Ok(Self {
            chat_url: config.endpoint("/v1/chat/completions"),
            transport: BlockingTransport::new(PROVIDER, headers, config.client_options.timeout),
        })
    }
}

impl MistralClient for HttpMistralClient {
    fn chat(&self, model: &str, payload: &MistralPayload) -> Result<ChatCompletionResponse> {
        self.transport.post_json(&self.chat_url, &payload.to_body(model)?)
    }

    fn chat_stream(
        &self,
        model: &str,
        payload: &MistralPayload,
    ) -> Result<ChunkIter<ChatCompletionChunk>> {
        let events = self.transport.post_sse(&self.chat_url, &payload.to_body(model)?)?;
        Ok(Box::new(SseChunks::new(events, decode_event)))
    }
}

/// Async HTTP client for the Mistral API
#[derive(Debug, Clone)]
pub struct AsyncHttpMistralClient {
    chat_url: String,
    transport: AsyncTransport,
}

impl AsyncHttpMistralClient {
    /// Create a client from a configuration
    pub fn new(config: &MistralConfig) -> Result<Self> {
        let options = &config.async_client_options;
        let headers = config.headers(options)?;
        Ok(Self {
            chat_url: config.endpoint("/v1/chat/completions"),
            transport: AsyncTransport::new(PROVIDER, headers, options.timeout)?,
        })
    }
}

#[async_trait]
impl AsyncMistralClient for AsyncHttpMistralClient {
    async fn chat(&self, model: &str, payload: &MistralPayload) -> Result<ChatCompletionResponse> {
        let body = payload.to_body(model)?;
        self.transport.post_json(&self.chat_url, &body).await
    }

    async fn chat_stream(
        &self,
        model: &str,
        payload: &MistralPayload,
    ) -> Result<ChunkStream<ChatCompletionChunk>> {
        let body = payload.to_body(model)?;
        let events = self.transport.post_event_stream(&self.chat_url, &body).await?;
        Ok(Box::pin(SseChunks::new(events, decode_event)))
    }
}
