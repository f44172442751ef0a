//! Anthropic text-completion provider
//!
//! Targets the legacy `/v1/complete` API, where the whole conversation is a
//! single prompt string with `Human:` and `Assistant:` turn markers.

mod client;
mod config;
pub(crate) mod converter;
mod provider;
pub(crate) mod stream;

#[cfg(test)]
mod tests;

pub use client::{AnthropicClient, AsyncAnthropicClient, AsyncHttpAnthropicClient, HttpAnthropicClient};
pub use config::{AnthropicConfig, MODELS};
pub use converter::{AnthropicCompletion, AnthropicNormalizer, AnthropicPayload, AI_PROMPT, HUMAN_PROMPT};
pub use provider::Anthropic;

/// Provider name used in errors and logs
pub const PROVIDER: &str = "anthropic";
