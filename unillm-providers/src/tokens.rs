//! Token estimation with a general-purpose BPE tokenizer

use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use unillm_core::{Error, Message, Result};

/// Fixed per-message overhead of the chat format
const MESSAGE_OVERHEAD: usize = 4;

/// Estimates token counts with the `cl100k_base` encoding
///
/// For vendors without a native counting endpoint this is an approximation:
/// their own tokenizers differ from `cl100k_base`, so counts are close but
/// not exact.
#[derive(Clone)]
pub struct TokenEstimator {
    encoder: Arc<CoreBPE>,
}

impl TokenEstimator {
    /// Load the `cl100k_base` encoding
    pub fn cl100k() -> Result<Self> {
        let encoder = tiktoken_rs::cl100k_base().map_err(|e| {
            Error::Configuration(format!("Failed to load cl100k_base tokenizer: {e}"))
        })?;
        Ok(Self {
            encoder: Arc::new(encoder),
        })
    }

    /// Count tokens in plain text, special tokens treated as text
    pub fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.encoder.encode_ordinary(text).len()
    }

    /// Count one chat message: role and content plus the format overhead
    pub fn count_message(&self, message: &Message) -> usize {
        let text = format!("{}{}", message.role, message.content);
        self.count_text(&text) + MESSAGE_OVERHEAD
    }

    /// Count a list of chat messages
    pub fn count_messages(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.count_message(m)).sum()
    }
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("encoding", &"cl100k_base")
            .finish()
    }
}
