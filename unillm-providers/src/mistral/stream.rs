//! Mistral streaming implementation
//!
//! Chat streams are unnamed SSE events, each carrying one JSON chunk with a
//! structured delta, and end with a literal `[DONE]`. The first chunk usually
//! only announces the assistant role and has no text; the final chunk carries
//! usage.

use super::converter::MistralUsage;
use super::PROVIDER;
use crate::error;
use crate::stream_utils::{SseAction, SseEvent};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;
use unillm_core::adapter::StreamChunk;
use unillm_core::{Result, Usage};

/// Incremental message content
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeltaMessage {
    /// Role, sent on the first chunk
    #[serde(default)]
    pub role: Option<String>,
    /// Text delta
    #[serde(default)]
    pub content: Option<String>,
}

/// One choice of a streamed chunk
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChunkChoice {
    /// Position of the choice
    #[serde(default)]
    pub index: u32,
    /// The delta for this choice
    #[serde(default)]
    pub delta: DeltaMessage,
    /// Why generation stopped, on the last chunk
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One streamed `chat.completion.chunk`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatCompletionChunk {
    /// Response identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Model that served the request
    #[serde(default)]
    pub model: Option<String>,
    /// Deltas, one per choice
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Token usage, on the last chunk
    #[serde(default)]
    pub usage: Option<MistralUsage>,
}

impl StreamChunk for ChatCompletionChunk {
    fn into_fragment(self) -> Option<String> {
        self.choices.into_iter().next()?.delta.content
    }

    fn usage(&self) -> Option<Usage> {
        self.usage.map(Usage::from)
    }
}

pub(crate) fn decode_event(event: SseEvent) -> Result<SseAction<ChatCompletionChunk>> {
    let data = event.data.trim();
    if data == "[DONE]" {
        return Ok(SseAction::Done);
    }
    if data.is_empty() {
        return Ok(SseAction::Skip);
    }

    let value: Value = serde_json::from_str(data).map_err(|e| error::decode_error(PROVIDER, e))?;
    let is_error = value.get("object").and_then(Value::as_str) == Some("error");
    if is_error || value.get("error").is_some() {
        return Err(error::event_error(PROVIDER, data));
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_value(value).map_err(|e| error::decode_error(PROVIDER, e))?;
    trace!(
        choices = chunk.choices.len(),
        has_usage = chunk.usage.is_some(),
        "Mistral chunk"
    );
    Ok(SseAction::Chunk(chunk))
}
