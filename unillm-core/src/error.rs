//! Error types for the Unillm library

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// The main error type for all Unillm operations
///
/// Request-shaping failures (`InvalidRole`, `UnsupportedFeature`,
/// `ParameterConflict`, `Validation`) are raised before any vendor call is
/// attempted. Everything a vendor client reports arrives as [`Error::Vendor`]
/// and is handed back to the caller untouched.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A history entry carries a role the backend does not accept
    InvalidRole {
        /// The offending role as given by the caller
        role: String,
        /// Human readable list of accepted roles
        allowed: &'static str,
    },

    /// The selected backend or model does not support a requested feature
    UnsupportedFeature {
        /// Provider name (e.g., "anthropic", "mistral")
        provider: &'static str,
        /// Model identifier the request was built for
        model: String,
        /// The feature that was requested
        feature: &'static str,
    },

    /// A passthrough parameter collides with a field the normalizer owns
    ParameterConflict {
        /// The colliding key
        key: String,
    },

    /// Failure reported by a vendor client
    Vendor {
        /// Provider name (e.g., "anthropic", "mistral")
        provider: String,
        /// Error message
        message: String,
        /// HTTP status code, if the failure came from an HTTP response
        status: Option<u16>,
        /// Time to wait before retrying (for rate limits)
        retry_after: Option<Duration>,
        /// Underlying error if available
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Local serialization errors
    Serialization {
        /// Error message
        message: String,
        /// Underlying error if available
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Validation errors
    Validation(String),

    /// Configuration errors
    Configuration(String),
}

impl Error {
    /// Create a vendor error without status or source
    pub fn vendor(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Vendor {
            provider: provider.into(),
            message: message.into(),
            status: None,
            retry_after: None,
            source: None,
        }
    }

    /// Whether this error was reported by a vendor client
    pub fn is_vendor(&self) -> bool {
        matches!(self, Error::Vendor { .. })
    }

    /// Whether this error was raised while shaping the request
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidRole { .. }
                | Error::UnsupportedFeature { .. }
                | Error::ParameterConflict { .. }
                | Error::Validation(_)
        )
    }

    /// Suggested wait before retrying, when the vendor sent one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Vendor { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRole { role, allowed } => {
                write!(f, "Invalid role {role}, role must be {allowed}")
            }
            Error::UnsupportedFeature {
                provider,
                model,
                feature,
            } => write!(f, "Unsupported feature ({provider}/{model}): {feature}"),
            Error::ParameterConflict { key } => write!(
                f,
                "Parameter conflict: `{key}` is already set by the request normalizer"
            ),
            Error::Vendor {
                provider,
                message,
                status,
                ..
            } => match status {
                Some(status) => write!(f, "Vendor error ({provider}, HTTP {status}): {message}"),
                None => write!(f, "Vendor error ({provider}): {message}"),
            },
            Error::Serialization { message, .. } => write!(f, "Serialization error: {message}"),
            Error::Validation(msg) => write!(f, "Validation error: {msg}"),
            Error::Configuration(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Vendor { source, .. } | Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn StdError + 'static)),
            _ => None,
        }
    }
}

/// Result type alias for Unillm operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
