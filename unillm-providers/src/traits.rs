//! Common traits for provider implementations

use unillm_core::{GenerationRequest, Result};

/// Translate a vendor-agnostic request into one backend's wire shape
///
/// Implementations are pure: no I/O, and the same request always yields the
/// same payload. Every request-shaping error is raised here, so a provider
/// can reject a request before touching its vendor clients.
pub trait RequestNormalizer {
    /// The vendor-shaped argument set
    type Payload;

    /// Build the payload for `request`, with streaming on or off
    fn normalize(&self, request: &GenerationRequest, stream: bool) -> Result<Self::Payload>;
}
