//! Constants for provider implementations

use std::time::Duration;

/// Default Anthropic base URL
pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default Mistral base URL
pub const MISTRAL_DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Environment variable holding the Mistral API key
pub const MISTRAL_API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Default request timeout for both blocking and async clients
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
