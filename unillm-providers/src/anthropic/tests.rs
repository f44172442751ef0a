//! HTTP tests for the Anthropic provider against a mock server

use super::*;
use crate::builder::AnthropicBuilder;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use unillm_core::{Error, GenerationRequest, Message, Provider};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_BODY: &str = "event: completion\n\
data: {\"completion\":\" Hello\",\"stop_reason\":null,\"model\":\"claude-2\"}\n\
\n\
event: ping\n\
data: {}\n\
\n\
event: completion\n\
data: {\"completion\":\" world\",\"stop_reason\":\"stop_sequence\",\"model\":\"claude-2\"}\n\
\n";

fn provider(server: &MockServer) -> Anthropic {
    AnthropicBuilder::new("test-key")
        .base_url(server.uri())
        .model("claude-2")
        .build()
        .unwrap()
}

async fn mount_completion(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/complete"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-2",
            "prompt": "\n\nHuman:Capital of France?\n\nAssistant:",
            "stream": false,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "completion": " Paris. ",
            "stop_reason": "stop_sequence",
            "model": "claude-2",
        })))
        .mount(server)
        .await;
}

async fn mount_stream(server: &MockServer, body: &'static str) {
    Mock::given(method("POST"))
        .and(path("/v1/complete"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_acomplete_over_http() {
    let server = MockServer::start().await;
    mount_completion(&server).await;
    let provider = provider(&server);

    let request = GenerationRequest::new("Capital of France?");
    let completion = provider.acomplete(&request).await.unwrap();

    assert_eq!(completion.text(), "Paris.");
    assert_eq!(completion.model_inputs().stop_sequences, vec![HUMAN_PROMPT]);
    assert_eq!(completion.meta().usage, None);
    assert!(provider.last_latency().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_complete_over_http_blocking() {
    let server = MockServer::start().await;
    mount_completion(&server).await;
    let uri = server.uri();

    let text = tokio::task::spawn_blocking(move || {
        let provider = AnthropicBuilder::new("test-key")
            .base_url(uri)
            .model("claude-2")
            .build()
            .unwrap();
        let request = GenerationRequest::new("Capital of France?");
        provider.complete(&request).unwrap().into_text()
    })
    .await
    .unwrap();

    assert_eq!(text, "Paris.");
}

#[test_log::test(tokio::test)]
async fn test_acomplete_stream_over_http() {
    let server = MockServer::start().await;
    mount_stream(&server, STREAM_BODY).await;
    let provider = provider(&server);

    let request = GenerationRequest::new("Greet me");
    let stream = provider.acomplete_stream(&request).await.unwrap();
    assert!(stream.model_inputs().stream);

    let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
    assert_eq!(fragments, vec!["Hello", " world"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_complete_stream_over_http_blocking() {
    let server = MockServer::start().await;
    mount_stream(&server, STREAM_BODY).await;
    let uri = server.uri();

    let fragments = tokio::task::spawn_blocking(move || {
        let provider = AnthropicBuilder::new("test-key")
            .base_url(uri)
            .model("claude-2")
            .build()
            .unwrap();
        let request = GenerationRequest::new("Greet me");
        provider
            .complete_stream(&request)
            .unwrap()
            .collect::<unillm_core::Result<Vec<String>>>()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(fragments, vec!["Hello", " world"]);
}

#[tokio::test]
async fn test_error_event_ends_stream() {
    let server = MockServer::start().await;
    let body = "event: completion\n\
data: {\"completion\":\" Par\"}\n\
\n\
event: error\n\
data: {\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\
\n";
    mount_stream(&server, body).await;
    let provider = provider(&server);

    let mut stream = provider
        .acomplete_stream(&GenerationRequest::new("Capital?"))
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap(), "Par");
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.to_string(), "Vendor error (anthropic): Overloaded");
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_rate_limit_status_is_vendor_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/complete"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "3")
                .set_body_json(json!({
                    "type": "error",
                    "error": {"type": "rate_limit_error", "message": "Too many requests"}
                })),
        )
        .mount(&server)
        .await;
    let provider = provider(&server);
    let request = GenerationRequest::new("Hi");

    let err = provider.acomplete(&request).await.unwrap_err();
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    assert!(matches!(
        err,
        Error::Vendor { status: Some(429), ref message, .. } if message == "Too many requests"
    ));

    let err = provider.acomplete_stream(&request).await.unwrap_err();
    assert!(matches!(err, Error::Vendor { status: Some(429), .. }));
}

#[tokio::test]
async fn test_request_errors_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let provider = AnthropicBuilder::new("test-key")
        .base_url(server.uri())
        .model("claude-v1")
        .build()
        .unwrap();

    let request = GenerationRequest::builder("Hi").system_message("sys").build();
    let err = provider.acomplete(&request).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedFeature { .. }));

    let request = GenerationRequest::builder("Hi")
        .message(Message::system("sys"))
        .build();
    assert!(matches!(
        provider.acomplete_stream(&request).await,
        Err(Error::InvalidRole { .. })
    ));
    assert!(provider.last_latency().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_count_tokens_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages/count_tokens"))
        .and(body_partial_json(json!({
            "model": "claude-2",
            "messages": [{"role": "user", "content": "How many tokens?"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"input_tokens": 12})))
        .expect(1)
        .mount(&server)
        .await;
    let uri = server.uri();

    let (empty, counted) = tokio::task::spawn_blocking(move || {
        let provider = AnthropicBuilder::new("test-key")
            .base_url(uri)
            .model("claude-2")
            .build()
            .unwrap();
        (
            provider.count_tokens("").unwrap(),
            provider.count_tokens("How many tokens?").unwrap(),
        )
    })
    .await
    .unwrap();

    assert_eq!(empty, 0);
    assert_eq!(counted, 12);
}
