//! Provider implementations for the Unillm completion library
//!
//! Two backend families are supported: Anthropic text completions, where the
//! conversation is flattened into one prompt string with turn markers, and
//! Mistral chat completions, where it is sent as a list of role-tagged
//! messages. Both sit behind [`unillm_core::Provider`].

#![warn(missing_docs)]

pub mod builder;
pub mod constants;
pub mod error;
pub mod http;
pub mod stream_utils;
pub mod tokens;
pub mod traits;

// Provider implementations
pub mod anthropic;
pub mod mistral;

// Re-export provider types
pub use anthropic::Anthropic;
pub use mistral::Mistral;

// Re-export common traits
pub use builder::{AnthropicBuilder, MistralBuilder, ProviderBuilder};
pub use http::ClientOptions;
pub use traits::RequestNormalizer;
