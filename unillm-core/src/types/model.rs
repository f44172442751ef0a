//! Static model information: prices and token limits

use serde::Serialize;

/// Price and limit data for one model identifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelInfo {
    /// Model identifier as sent to the vendor
    pub id: &'static str,
    /// USD per million prompt tokens
    pub prompt_price: f64,
    /// USD per million completion tokens
    pub completion_price: f64,
    /// Context window in tokens
    pub token_limit: u32,
    /// Whether the model accepts a system message
    pub system_message: bool,
}

impl ModelInfo {
    /// Estimated USD cost of a call with the given token counts
    pub fn cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (f64::from(prompt_tokens) * self.prompt_price
            + f64::from(completion_tokens) * self.completion_price)
            / 1_000_000.0
    }
}

/// Find a model in a table by identifier
pub fn lookup(table: &'static [ModelInfo], id: &str) -> Option<&'static ModelInfo> {
    table.iter().find(|info| info.id == id)
}
