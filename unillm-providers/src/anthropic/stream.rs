//! Anthropic streaming implementation
//!
//! `/v1/complete` streams named events: `completion` carries a text delta,
//! `ping` keeps the connection alive and `error` reports a failure after the
//! response has started.

use super::converter::AnthropicCompletion;
use super::PROVIDER;
use crate::error;
use crate::stream_utils::{SseAction, SseEvent};
use tracing::trace;
use unillm_core::Result;

pub(crate) fn decode_event(event: SseEvent) -> Result<SseAction<AnthropicCompletion>> {
    match event.event.as_str() {
        "completion" => {
            let chunk: AnthropicCompletion = serde_json::from_str(&event.data)
                .map_err(|e| error::decode_error(PROVIDER, e))?;
            trace!(
                len = chunk.completion.len(),
                stop_reason = ?chunk.stop_reason,
                "Anthropic chunk"
            );
            Ok(SseAction::Chunk(chunk))
        }
        "error" => Err(error::event_error(PROVIDER, &event.data)),
        _ => Ok(SseAction::Skip),
    }
}
