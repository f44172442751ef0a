//! Server-sent event plumbing shared by the vendor streams
//!
//! Both vendors stream over SSE. Blocking calls read the response body line
//! by line through [`SseReader`]; async calls go through `reqwest-eventsource`
//! wrapped in [`SseStream`]. Either way the vendor module only supplies a
//! decoder, and [`SseChunks`] turns events into raw vendor chunks.

use crate::error;
use futures::StreamExt;
use futures_core::Stream;
use reqwest_eventsource::{Event, EventSource};
use std::fmt;
use std::io::BufRead;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::trace;
use unillm_core::{Error, Result};

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name, `message` when the server did not name it
    pub event: String,
    /// Event payload, multi-line data joined with `\n`
    pub data: String,
}

impl SseEvent {
    fn new(event: Option<String>, data: String) -> Self {
        Self {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        }
    }
}

/// What a vendor decoder made of one event
#[derive(Debug)]
pub enum SseAction<C> {
    /// A chunk to hand to the streaming adapter
    Chunk(C),
    /// Keep-alive or otherwise uninteresting event
    Skip,
    /// The vendor signalled the end of the stream
    Done,
}

/// Vendor-specific event decoder
pub type DecodeFn<C> = fn(SseEvent) -> Result<SseAction<C>>;

/// Common SSE (Server-Sent Events) field parsing
pub fn parse_sse_line(line: &str) -> Option<(&str, &str)> {
    if let Some(pos) = line.find(':') {
        let (field, value) = line.split_at(pos);
        let value = value.get(1..)?.trim_start(); // Skip the ':' and trim spaces
        Some((field, value))
    } else {
        None
    }
}

/// Blocking SSE reader over any buffered byte source
pub struct SseReader<R> {
    reader: R,
    provider: &'static str,
    line: String,
    done: bool,
}

impl<R: BufRead> SseReader<R> {
    /// Create a reader for a response body
    pub fn new(provider: &'static str, reader: R) -> Self {
        Self {
            reader,
            provider,
            line: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for SseReader<R> {
    type Item = Result<SseEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut event = None;
        let mut data: Option<String> = None;
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    self.done = true;
                    return data.map(|data| Ok(SseEvent::new(event, data)));
                }
                Ok(_) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::Vendor {
                        provider: self.provider.to_string(),
                        message: format!("Failed to read event stream: {e}"),
                        status: None,
                        retry_after: None,
                        source: Some(Box::new(e)),
                    }));
                }
            }

            let line = self.line.trim_end_matches(&['\r', '\n'][..]);
            if line.is_empty() {
                if let Some(data) = data.take() {
                    return Some(Ok(SseEvent::new(event, data)));
                }
                event = None;
                continue;
            }

            match parse_sse_line(line) {
                Some(("event", value)) => event = Some(value.to_string()),
                Some(("data", value)) => match data.as_mut() {
                    Some(buffer) => {
                        buffer.push('\n');
                        buffer.push_str(value);
                    }
                    None => data = Some(value.to_string()),
                },
                // comments, ids and retry hints
                _ => {}
            }
        }
    }
}

impl<R> fmt::Debug for SseReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseReader")
            .field("provider", &self.provider)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// Async SSE stream over an open [`EventSource`]
///
/// The event source is closed as soon as the stream ends or fails, so it
/// never reconnects on its own.
pub struct SseStream {
    inner: EventSource,
    provider: &'static str,
    done: bool,
}

impl SseStream {
    /// Wait for the connection to open and return the event stream
    ///
    /// A non-success status is reported here, with the response body as the
    /// error message, rather than on the first poll.
    pub async fn connect(provider: &'static str, mut source: EventSource) -> Result<Self> {
        match source.next().await {
            Some(Ok(Event::Open)) => Ok(Self {
                inner: source,
                provider,
                done: false,
            }),
            Some(Ok(Event::Message(_))) => {
                source.close();
                Err(Error::vendor(provider, "Event stream sent data before opening"))
            }
            Some(Err(reqwest_eventsource::Error::InvalidStatusCode(status, response))) => {
                source.close();
                let headers = response.headers().clone();
                let body = response.text().await.unwrap_or_default();
                Err(error::status_error(provider, status, &headers, &body))
            }
            Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                source.close();
                Ok(Self {
                    inner: source,
                    provider,
                    done: true,
                })
            }
            Some(Err(e)) => {
                source.close();
                Err(Error::vendor(provider, format!("Failed to open event stream: {e}")))
            }
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.inner.close();
    }
}

impl Stream for SseStream {
    type Item = Result<SseEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => continue,
                Poll::Ready(Some(Ok(Event::Message(msg)))) => {
                    trace!(provider = self.provider, event = %msg.event, "SSE event");
                    return Poll::Ready(Some(Ok(SseEvent {
                        event: msg.event,
                        data: msg.data,
                    })));
                }
                Poll::Ready(Some(Err(reqwest_eventsource::Error::StreamEnded)))
                | Poll::Ready(None) => {
                    self.finish();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(e))) => {
                    self.finish();
                    let message = format!("Event stream failed: {e}");
                    return Poll::Ready(Some(Err(Error::vendor(self.provider, message))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl fmt::Debug for SseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseStream")
            .field("provider", &self.provider)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// Raw vendor chunks decoded from a sequence of SSE events
///
/// Works over a blocking iterator of events as well as an async stream of
/// them. Ends after the vendor's end marker, the end of the events, or the
/// first error.
pub struct SseChunks<S, C> {
    events: S,
    decode: DecodeFn<C>,
    done: bool,
}

impl<S, C> SseChunks<S, C> {
    /// Decode `events` with a vendor decoder
    pub fn new(events: S, decode: DecodeFn<C>) -> Self {
        Self {
            events,
            decode,
            done: false,
        }
    }

    fn accept(&mut self, event: Option<Result<SseEvent>>) -> Option<Option<Result<C>>> {
        let outcome = match event {
            Some(Ok(event)) => match (self.decode)(event) {
                Ok(SseAction::Chunk(chunk)) => return Some(Some(Ok(chunk))),
                Ok(SseAction::Skip) => return None,
                Ok(SseAction::Done) => None,
                Err(e) => Some(Err(e)),
            },
            Some(Err(e)) => Some(Err(e)),
            None => None,
        };
        self.done = true;
        Some(outcome)
    }
}

impl<S, C> Iterator for SseChunks<S, C>
where
    S: Iterator<Item = Result<SseEvent>>,
{
    type Item = Result<C>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let event = self.events.next();
            if let Some(item) = self.accept(event) {
                return item;
            }
        }
        None
    }
}

impl<S, C> Stream for SseChunks<S, C>
where
    S: Stream<Item = Result<SseEvent>> + Unpin,
{
    type Item = Result<C>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        while !self.done {
            let event = match Pin::new(&mut self.events).poll_next(cx) {
                Poll::Ready(event) => event,
                Poll::Pending => return Poll::Pending,
            };
            if let Some(item) = self.accept(event) {
                return Poll::Ready(item);
            }
        }
        Poll::Ready(None)
    }
}

impl<S, C> fmt::Debug for SseChunks<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseChunks")
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
