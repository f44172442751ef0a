//! Mistral chat-completion provider

mod client;
mod config;
pub(crate) mod converter;
mod provider;
pub(crate) mod stream;


pub use client::{AsyncHttpMistralClient, AsyncMistralClient, HttpMistralClient, MistralClient};
pub use config::{MistralConfig, MODELS};
pub use converter::{
    ChatChoice, ChatCompletionResponse, ChatMessage, MistralNormalizer, MistralPayload,
    MistralUsage,
};
pub use provider::Mistral;
pub use stream::{ChatCompletionChunk, ChunkChoice, DeltaMessage};

/// Provider name used in errors and logs
pub const PROVIDER: &str = "mistral";
