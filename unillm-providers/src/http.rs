//! HTTP transport shared by the vendor clients

use crate::constants::DEFAULT_TIMEOUT;
use crate::error;
use crate::stream_utils::{SseReader, SseStream};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest_eventsource::EventSource;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::BufReader;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;
use unillm_core::{Error, Result};

/// Options applied when building one HTTP client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whole-request timeout, streaming bodies included
    pub timeout: Duration,
    /// Headers sent with every request in addition to the vendor's own
    pub headers: HeaderMap,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            headers: HeaderMap::new(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Configuration(format!("Invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Configuration(format!("Invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

/// How a vendor expects the API key
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <key>`
    Bearer(&'a str),
    /// The key in a vendor-specific header
    Header(&'static str, &'a str),
}

/// Helper to create common headers
pub fn create_headers(auth: Auth<'_>, additional: &HeaderMap) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let invalid_key = |e: reqwest::header::InvalidHeaderValue| {
        Error::Configuration(format!("Invalid API key: {e}"))
    };
    match auth {
        Auth::Bearer(key) => {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid_key)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Auth::Header(name, key) => {
            let mut value = HeaderValue::from_str(key).map_err(invalid_key)?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }
    }

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    headers.extend(additional.clone());

    Ok(headers)
}

/// Blocking HTTP transport for one vendor
///
/// The underlying `reqwest` blocking client is built on first use, so a
/// provider can be constructed (and used through its async client) from
/// inside an async runtime.
#[derive(Debug)]
pub struct BlockingTransport {
    provider: &'static str,
    headers: HeaderMap,
    timeout: Duration,
    client: OnceLock<reqwest::blocking::Client>,
}

impl BlockingTransport {
    /// Create a transport sending `headers` with every request
    pub fn new(provider: &'static str, headers: HeaderMap, timeout: Duration) -> Self {
        Self {
            provider,
            headers,
            timeout,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.headers.clone())
            .build()
            .map_err(|e| error::transport_error(self.provider, e))?;
        Ok(self.client.get_or_init(|| client))
    }

    fn send(
        &self,
        url: &str,
        body: &Value,
        accept: &'static str,
    ) -> Result<reqwest::blocking::Response> {
        debug!(provider = self.provider, url, "POST");
        let response = self
            .client()?
            .post(url)
            .header(ACCEPT, accept)
            .json(body)
            .send()
            .map_err(|e| error::transport_error(self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().unwrap_or_default();
            return Err(error::status_error(self.provider, status, &headers, &text));
        }
        Ok(response)
    }

    /// Send a POST request and decode the JSON response
    pub fn post_json<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        let text = self
            .send(url, body, "application/json")?
            .text()
            .map_err(|e| error::transport_error(self.provider, e))?;
        serde_json::from_str(&text).map_err(|e| error::decode_error(self.provider, e))
    }

    /// Send a streaming POST request and read the response as SSE
    pub fn post_sse(
        &self,
        url: &str,
        body: &Value,
    ) -> Result<SseReader<BufReader<reqwest::blocking::Response>>> {
        let response = self.send(url, body, "text/event-stream")?;
        Ok(SseReader::new(self.provider, BufReader::new(response)))
    }
}

/// Async HTTP transport for one vendor
#[derive(Debug, Clone)]
pub struct AsyncTransport {
    provider: &'static str,
    client: reqwest::Client,
}

impl AsyncTransport {
    /// Create a transport sending `headers` with every request
    pub fn new(provider: &'static str, headers: HeaderMap, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| error::transport_error(provider, e))?;

        Ok(Self { provider, client })
    }

    /// Send a POST request and decode the JSON response
    pub async fn post_json<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        debug!(provider = self.provider, url, "POST");
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| error::transport_error(self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(error::status_error(self.provider, status, &headers, &text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| error::transport_error(self.provider, e))?;
        serde_json::from_str(&text).map_err(|e| error::decode_error(self.provider, e))
    }

    /// Send a streaming POST request and open it as an event stream
    pub async fn post_event_stream(&self, url: &str, body: &Value) -> Result<SseStream> {
        debug!(provider = self.provider, url, "POST (event stream)");
        let builder = self
            .client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(body);
        let source = EventSource::new(builder).map_err(|e| {
            Error::Configuration(format!("Failed to create event source: {e}"))
        })?;

        SseStream::connect(self.provider, source).await
    }
}
