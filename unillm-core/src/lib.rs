//! Core traits and types for the Unillm completion library
//!
//! This crate provides the vendor-independent half of Unillm: the request and
//! result types, the [`Provider`] trait with its four invocation modes, the
//! streaming adapter shared by every backend and the latency tracker.

#![deny(unsafe_code)]

pub mod adapter;
pub mod error;
pub mod latency;
pub mod provider;
pub mod types;

// Re-export commonly used items
pub use adapter::{AsyncFragments, ChunkIter, ChunkStream, Fragments, StreamChunk};
pub use error::{Error, Result};
pub use latency::{LastLatency, LatencyTracker};
pub use provider::Provider;
pub use types::{
    message::{Message, Role},
    model::ModelInfo,
    request::{
        BuildError, ExtraPolicy, GenerationRequest, GenerationRequestBuilder, DEFAULT_MAX_TOKENS,
        LOCKED_KEYS,
    },
    result::{AsyncStreamCompletion, Completion, CompletionMeta, StreamCompletion, Usage},
};
