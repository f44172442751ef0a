//! Completion results returned by providers

use crate::adapter::{AsyncFragments, Fragments};
use crate::error::Result;
use crate::provider::Provider;
use futures_core::{FusedStream, Stream};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

impl Usage {
    /// Create usage from prompt and completion counts
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Usage(prompt: {}, completion: {}, total: {})",
            self.prompt_tokens, self.completion_tokens, self.total_tokens
        )
    }
}

/// Metadata about a completed call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionMeta {
    /// Wall-clock time spent in the vendor call
    pub latency: Duration,
    /// Token usage, when the vendor reports it
    pub usage: Option<Usage>,
    /// Estimated USD cost, when usage and prices are known
    pub cost: Option<f64>,
    /// Custom metadata
    pub custom: Map<String, Value>,
}

impl CompletionMeta {
    /// Latency in seconds
    pub fn latency_secs(&self) -> f64 {
        self.latency.as_secs_f64()
    }

    /// Prompt token count, when reported
    pub fn tokens_prompt(&self) -> Option<u32> {
        self.usage.as_ref().map(|u| u.prompt_tokens)
    }

    /// Completion token count, when reported
    pub fn tokens_completion(&self) -> Option<u32> {
        self.usage.as_ref().map(|u| u.completion_tokens)
    }

    /// Flatten into the free-form mapping shape
    ///
    /// Always contains `latency`; `tokens_prompt`, `tokens_completion` and
    /// `cost` appear only when known. Custom entries never replace them.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.custom.clone();
        map.insert("latency".into(), json!(self.latency_secs()));
        if let Some(usage) = &self.usage {
            map.insert("tokens_prompt".into(), json!(usage.prompt_tokens));
            map.insert("tokens_completion".into(), json!(usage.completion_tokens));
        }
        if let Some(cost) = self.cost {
            map.insert("cost".into(), json!(cost));
        }
        map
    }
}

/// A finished single-shot completion
///
/// Holds the final text, the exact payload sent to the vendor, a borrowed
/// reference to the provider that produced it and call metadata.
pub struct Completion<'p, P: Provider + ?Sized> {
    text: String,
    model_inputs: P::Payload,
    provider: &'p P,
    meta: CompletionMeta,
}

impl<'p, P: Provider + ?Sized> Completion<'p, P> {
    /// Assemble a completion
    pub fn new(
        text: impl Into<String>,
        model_inputs: P::Payload,
        provider: &'p P,
        meta: CompletionMeta,
    ) -> Self {
        Self {
            text: text.into(),
            model_inputs,
            provider,
            meta,
        }
    }

    /// The completion text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The normalized payload that produced this completion
    pub fn model_inputs(&self) -> &P::Payload {
        &self.model_inputs
    }

    /// The provider that produced this completion
    pub fn provider(&self) -> &'p P {
        self.provider
    }

    /// Call metadata
    pub fn meta(&self) -> &CompletionMeta {
        &self.meta
    }

    /// Consume the completion, keeping only the text
    pub fn into_text(self) -> String {
        self.text
    }

    /// JSON view of the completion for logging or persistence
    pub fn to_json(&self) -> Result<Value> {
        Ok(json!({
            "text": self.text,
            "model_inputs": serde_json::to_value(&self.model_inputs)?,
            "provider": {
                "name": self.provider.name(),
                "model": self.provider.model(),
            },
            "meta": self.meta.to_map(),
        }))
    }
}

impl<P: Provider + ?Sized> fmt::Debug for Completion<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("text", &self.text)
            .field("model_inputs", &self.model_inputs)
            .field("provider", &self.provider.name())
            .field("meta", &self.meta)
            .finish()
    }
}

impl<P: Provider + ?Sized> fmt::Display for Completion<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A streaming completion for blocking callers
///
/// Iterating yields each text fragment once, in vendor order. The sequence
/// cannot be restarted.
pub struct StreamCompletion<'p, P: Provider + ?Sized> {
    fragments: Fragments<P::Chunk>,
    model_inputs: P::Payload,
    provider: &'p P,
}

impl<'p, P: Provider + ?Sized> StreamCompletion<'p, P> {
    /// Assemble a streaming completion
    pub fn new(fragments: Fragments<P::Chunk>, model_inputs: P::Payload, provider: &'p P) -> Self {
        Self {
            fragments,
            model_inputs,
            provider,
        }
    }

    /// The normalized payload that opened this stream
    pub fn model_inputs(&self) -> &P::Payload {
        &self.model_inputs
    }

    /// The provider that opened this stream
    pub fn provider(&self) -> &'p P {
        self.provider
    }

    /// Usage reported by the vendor so far
    pub fn usage(&self) -> Option<&Usage> {
        self.fragments.usage()
    }

    /// Drain the remaining fragments into one string
    pub fn into_text(self) -> Result<String> {
        self.fragments.collect()
    }
}

impl<P: Provider + ?Sized> Iterator for StreamCompletion<'_, P> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.fragments.next()
    }
}

impl<P: Provider + ?Sized> fmt::Debug for StreamCompletion<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCompletion")
            .field("fragments", &self.fragments)
            .field("model_inputs", &self.model_inputs)
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// A streaming completion for async callers
///
/// Implements [`Stream`]; every fragment fetch is a suspension point.
pub struct AsyncStreamCompletion<'p, P: Provider + ?Sized> {
    fragments: AsyncFragments<P::Chunk>,
    model_inputs: P::Payload,
    provider: &'p P,
}

impl<'p, P: Provider + ?Sized> AsyncStreamCompletion<'p, P> {
    /// Assemble an async streaming completion
    pub fn new(
        fragments: AsyncFragments<P::Chunk>,
        model_inputs: P::Payload,
        provider: &'p P,
    ) -> Self {
        Self {
            fragments,
            model_inputs,
            provider,
        }
    }

    /// The normalized payload that opened this stream
    pub fn model_inputs(&self) -> &P::Payload {
        &self.model_inputs
    }

    /// The provider that opened this stream
    pub fn provider(&self) -> &'p P {
        self.provider
    }

    /// Usage reported by the vendor so far
    pub fn usage(&self) -> Option<&Usage> {
        self.fragments.usage()
    }

    /// Drain the remaining fragments into one string
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(fragment) =
            std::future::poll_fn(|cx| Pin::new(&mut self.fragments).poll_next(cx)).await
        {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl<P: Provider + ?Sized> Stream for AsyncStreamCompletion<'_, P> {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.fragments).poll_next(cx)
    }
}

impl<P: Provider + ?Sized> FusedStream for AsyncStreamCompletion<'_, P> {
    fn is_terminated(&self) -> bool {
        self.fragments.is_terminated()
    }
}

impl<P: Provider + ?Sized> fmt::Debug for AsyncStreamCompletion<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncStreamCompletion")
            .field("fragments", &self.fragments)
            .field("model_inputs", &self.model_inputs)
            .field("provider", &self.provider.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_new_totals() {
        let usage = Usage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
        assert_eq!(usage.to_string(), "Usage(prompt: 12, completion: 30, total: 42)");
    }

    #[test]
    fn test_meta_to_map() {
        let meta = CompletionMeta {
            latency: Duration::from_millis(1500),
            usage: Some(Usage::new(10, 5)),
            cost: Some(0.25),
            custom: Map::new(),
        };
        let map = meta.to_map();

        assert_eq!(map["latency"], json!(1.5));
        assert_eq!(map["tokens_prompt"], json!(10));
        assert_eq!(map["tokens_completion"], json!(5));
        assert_eq!(map["cost"], json!(0.25));
    }

    #[test]
    fn test_meta_to_map_minimal() {
        let mut custom = Map::new();
        custom.insert("latency".into(), json!("bogus"));
        custom.insert("finish_reason".into(), json!("stop"));
        let meta = CompletionMeta {
            latency: Duration::from_secs(2),
            custom,
            ..Default::default()
        };
        let map = meta.to_map();

        assert_eq!(map["latency"], json!(2.0));
        assert_eq!(map["finish_reason"], json!("stop"));
        assert!(!map.contains_key("tokens_prompt"));
        assert!(!map.contains_key("cost"));
        assert_eq!(meta.tokens_prompt(), None);
    }
}
