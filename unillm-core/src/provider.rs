//! Core provider trait for LLM completions

use crate::adapter::StreamChunk;
use crate::error::Result;
use crate::types::model::ModelInfo;
use crate::types::request::GenerationRequest;
use crate::types::result::{AsyncStreamCompletion, Completion, StreamCompletion};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;

/// The fundamental trait for LLM completions
///
/// A provider binds one vendor's blocking and non-blocking clients to a model
/// identifier and exposes four invocation modes over the same
/// [`GenerationRequest`]. Every mode normalizes the request first, so a
/// request the backend cannot express fails before any vendor call is made.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The vendor-shaped argument set built from a request
    type Payload: Clone + Debug + Serialize + Send + Sync + Unpin + 'static;

    /// The raw chunk type of the vendor's streaming responses
    type Chunk: StreamChunk + Send + 'static;

    /// Provider name (e.g., "anthropic")
    fn name(&self) -> &'static str;

    /// The model identifier requests are sent to
    fn model(&self) -> &str;

    /// Price and limit data for the model, if the model is known
    fn model_info(&self) -> Option<&'static ModelInfo>;

    /// Latency of the most recently finished vendor call on this instance
    ///
    /// Under concurrent use this may belong to any call; use
    /// [`CompletionMeta::latency`](crate::CompletionMeta) for a specific one.
    fn last_latency(&self) -> Option<Duration>;

    /// Count the tokens in `content` for this provider's model
    ///
    /// Depending on the provider this is a vendor-native count or an estimate
    /// from a general-purpose tokenizer. Empty content always counts as zero.
    fn count_tokens(&self, content: &str) -> Result<usize>;

    /// Blocking single-shot completion
    fn complete(&self, request: &GenerationRequest) -> Result<Completion<'_, Self>>;

    /// Non-blocking single-shot completion
    async fn acomplete<'a>(&'a self, request: &GenerationRequest) -> Result<Completion<'a, Self>>;

    /// Blocking streaming completion
    ///
    /// Returns before the stream is consumed; network I/O is only guaranteed
    /// to finish while iterating.
    fn complete_stream(&self, request: &GenerationRequest) -> Result<StreamCompletion<'_, Self>>;

    /// Non-blocking streaming completion
    async fn acomplete_stream<'a>(
        &'a self,
        request: &GenerationRequest,
    ) -> Result<AsyncStreamCompletion<'a, Self>>;
}
