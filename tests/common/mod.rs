//! Recording stub clients shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use std::sync::{Arc, Mutex};
use unillm::providers::anthropic::{
    Anthropic, AnthropicClient, AnthropicCompletion, AnthropicPayload, AsyncAnthropicClient,
};
use unillm::providers::mistral::{
    AsyncMistralClient, ChatChoice, ChatCompletionChunk, ChatCompletionResponse, ChatMessage,
    ChunkChoice, DeltaMessage, Mistral, MistralClient, MistralPayload, MistralUsage,
};
use unillm::{ChunkIter, ChunkStream, Error, Result};

type Reply<P> = Box<dyn Fn(&P) -> String + Send + Sync>;

/// A deterministic vendor client that records every payload it receives
pub struct Stub<P> {
    reply: Reply<P>,
    chunks: Vec<String>,
    stream_error: Option<String>,
    usage: Option<MistralUsage>,
    tokens: usize,
    calls: Mutex<Vec<P>>,
}

impl<P: Clone> Stub<P> {
    /// Always answer with `text`; streams split it on spaces
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chunks = split_words(&text);
        Self {
            reply: Box::new(move |_| text.clone()),
            chunks,
            stream_error: None,
            usage: None,
            tokens: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer with whatever `reply` derives from the payload
    pub fn echo(reply: impl Fn(&P) -> String + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            ..Self::new("")
        }
    }

    /// Stream exactly these chunks
    pub fn with_chunks<'a>(mut self, chunks: impl IntoIterator<Item = &'a str>) -> Self {
        self.chunks = chunks.into_iter().map(str::to_string).collect();
        self
    }

    /// End streams with a vendor error after the chunks
    pub fn failing_after(mut self, message: impl Into<String>) -> Self {
        self.stream_error = Some(message.into());
        self
    }

    /// Report usage on responses and on the last stream chunk
    pub fn with_usage(mut self, prompt_tokens: u32, completion_tokens: u32) -> Self {
        self.usage = Some(MistralUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        });
        self
    }

    /// Answer token count requests with `tokens`
    pub fn with_tokens(mut self, tokens: usize) -> Self {
        self.tokens = tokens;
        self
    }

    /// Payloads received so far, in call order
    pub fn calls(&self) -> Vec<P> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, payload: &P) -> String {
        self.calls.lock().unwrap().push(payload.clone());
        (self.reply)(payload)
    }

    fn stream_items<C>(&self, payload: &P, chunk: impl Fn(&str, bool) -> C) -> Vec<Result<C>> {
        self.calls.lock().unwrap().push(payload.clone());
        let last = self.chunks.len().saturating_sub(1);
        let mut items: Vec<Result<C>> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, text)| Ok(chunk(text, i == last)))
            .collect();
        if let Some(message) = &self.stream_error {
            items.push(Err(Error::vendor("stub", message.as_str())));
        }
        items
    }
}

fn split_words(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    for (i, word) in text.split(' ').enumerate() {
        if i == 0 {
            chunks.push(word.to_string());
        } else {
            chunks.push(format!(" {word}"));
        }
    }
    chunks
}

fn anthropic_chunk(text: &str) -> AnthropicCompletion {
    AnthropicCompletion {
        completion: text.to_string(),
        stop_reason: None,
        model: None,
    }
}

impl AnthropicClient for Stub<AnthropicPayload> {
    fn complete(&self, _model: &str, payload: &AnthropicPayload) -> Result<AnthropicCompletion> {
        Ok(anthropic_chunk(&self.record(payload)))
    }

    fn complete_stream(
        &self,
        _model: &str,
        payload: &AnthropicPayload,
    ) -> Result<ChunkIter<AnthropicCompletion>> {
        let items = self.stream_items(payload, |text, _| anthropic_chunk(text));
        Ok(Box::new(items.into_iter()))
    }

    fn count_tokens(&self, _model: &str, _text: &str) -> Result<usize> {
        Ok(self.tokens)
    }
}

#[async_trait]
impl AsyncAnthropicClient for Stub<AnthropicPayload> {
    async fn complete(
        &self,
        model: &str,
        payload: &AnthropicPayload,
    ) -> Result<AnthropicCompletion> {
        AnthropicClient::complete(self, model, payload)
    }

    async fn complete_stream(
        &self,
        _model: &str,
        payload: &AnthropicPayload,
    ) -> Result<ChunkStream<AnthropicCompletion>> {
        let items = self.stream_items(payload, |text, _| anthropic_chunk(text));
        Ok(Box::pin(stream::iter(items)))
    }
}

impl Stub<MistralPayload> {
    fn mistral_chunk(&self, text: &str, last: bool) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: Some("stub".to_string()),
            model: None,
            choices: vec![ChunkChoice {
                index: 0,
                delta: DeltaMessage {
                    role: None,
                    content: (!text.is_empty()).then(|| text.to_string()),
                },
                finish_reason: last.then(|| "stop".to_string()),
            }],
            usage: if last { self.usage } else { None },
        }
    }
}

impl MistralClient for Stub<MistralPayload> {
    fn chat(&self, model: &str, payload: &MistralPayload) -> Result<ChatCompletionResponse> {
        let text = self.record(payload);
        Ok(ChatCompletionResponse {
            id: Some("stub".to_string()),
            model: Some(model.to_string()),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: Some("assistant".to_string()),
                    content: Some(text),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: self.usage,
        })
    }

    fn chat_stream(
        &self,
        _model: &str,
        payload: &MistralPayload,
    ) -> Result<ChunkIter<ChatCompletionChunk>> {
        let items = self.stream_items(payload, |text, last| self.mistral_chunk(text, last));
        Ok(Box::new(items.into_iter()))
    }
}

#[async_trait]
impl AsyncMistralClient for Stub<MistralPayload> {
    async fn chat(&self, model: &str, payload: &MistralPayload) -> Result<ChatCompletionResponse> {
        MistralClient::chat(self, model, payload)
    }

    async fn chat_stream(
        &self,
        _model: &str,
        payload: &MistralPayload,
    ) -> Result<ChunkStream<ChatCompletionChunk>> {
        let items = self.stream_items(payload, |text, last| self.mistral_chunk(text, last));
        Ok(Box::pin(stream::iter(items)))
    }
}

/// An Anthropic provider for `model` backed by `stub`
pub fn anthropic(model: &str, stub: &Arc<Stub<AnthropicPayload>>) -> Anthropic {
    Anthropic::with_clients(model, stub.clone(), stub.clone())
}

/// A Mistral provider for `model` backed by `stub`
pub fn mistral(model: &str, stub: &Arc<Stub<MistralPayload>>) -> Mistral {
    Mistral::with_clients(model, stub.clone(), stub.clone()).unwrap()
}
