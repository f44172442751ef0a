//! Helpers turning transport failures into vendor errors

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use unillm_core::Error;

/// Build a vendor error from a non-success HTTP response
///
/// The message is taken from the vendor's JSON error body when it has one,
/// otherwise from the raw body or the status reason.
pub fn status_error(
    provider: &str,
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> Error {
    Error::Vendor {
        provider: provider.to_string(),
        message: vendor_message(status, body),
        status: Some(status.as_u16()),
        retry_after: retry_after(headers),
        source: None,
    }
}

/// Convert network errors to vendor errors
pub fn transport_error(provider: &str, error: reqwest::Error) -> Error {
    Error::Vendor {
        provider: provider.to_string(),
        message: error.to_string(),
        status: error.status().map(|s| s.as_u16()),
        retry_after: None,
        source: Some(Box::new(error)),
    }
}

/// Convert malformed vendor responses to vendor errors
pub fn decode_error(provider: &str, error: serde_json::Error) -> Error {
    Error::Vendor {
        provider: provider.to_string(),
        message: format!("Failed to parse response: {error}"),
        status: None,
        retry_after: None,
        source: Some(Box::new(error)),
    }
}

/// Build a vendor error from an error event inside a stream
pub fn event_error(provider: &str, data: &str) -> Error {
    let message = extract_message(data).unwrap_or_else(|| data.trim().to_string());
    Error::vendor(provider, message)
}

/// Parse the `retry-after` header given in whole or fractional seconds
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let secs: f64 = value.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

fn extract_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn vendor_message(status: StatusCode, body: &str) -> String {
    if let Some(message) = extract_message(body) {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
