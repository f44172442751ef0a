//! Streaming adapter: vendor chunks in, canonical text fragments out
//!
//! Every backend delivers streaming output differently. Some send a bare text
//! delta per chunk, others wrap the delta in a structured object and open the
//! stream with role-only preamble chunks. A vendor chunk type only has to say
//! which text it carries (and which usage it reports, if any); [`Fragments`]
//! and [`AsyncFragments`] turn the raw sequence into the public contract:
//!
//! - leading chunks without text are skipped,
//! - the first fragment has its leading whitespace removed,
//! - later empty fragments are dropped, everything else passes verbatim,
//! - an error ends the sequence after the fragments already delivered.

use crate::error::Result;
use crate::types::result::Usage;
use futures_core::{FusedStream, Stream};
use std::fmt;
use std::iter::FusedIterator;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::trace;

/// A raw chunk produced by a vendor streaming call
pub trait StreamChunk {
    /// The text delta carried by this chunk, if any
    fn into_fragment(self) -> Option<String>;

    /// Token usage reported by this chunk
    fn usage(&self) -> Option<Usage> {
        None
    }
}

/// Blocking sequence of raw vendor chunks
pub type ChunkIter<C> = Box<dyn Iterator<Item = Result<C>> + Send>;

/// Non-blocking sequence of raw vendor chunks
pub type ChunkStream<C> = Pin<Box<dyn Stream<Item = Result<C>> + Send>>;

#[derive(Debug, Default)]
struct FragmentFilter {
    started: bool,
    usage: Option<Usage>,
}

impl FragmentFilter {
    fn accept<C: StreamChunk>(&mut self, chunk: C) -> Option<String> {
        if let Some(usage) = chunk.usage() {
            self.usage = Some(usage);
        }
        let text = chunk.into_fragment()?;
        if self.started {
            return (!text.is_empty()).then_some(text);
        }

        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            return None;
        }
        self.started = true;
        if trimmed.len() == text.len() {
            Some(text)
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Lazy, single-pass fragment sequence for blocking callers
pub struct Fragments<C> {
    inner: ChunkIter<C>,
    filter: FragmentFilter,
    done: bool,
}

impl<C: StreamChunk> Fragments<C> {
    /// Wrap a raw chunk iterator
    pub fn new(inner: impl Iterator<Item = Result<C>> + Send + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            filter: FragmentFilter::default(),
            done: false,
        }
    }

    /// The last usage report seen so far
    pub fn usage(&self) -> Option<&Usage> {
        self.filter.usage.as_ref()
    }
}

impl<C: StreamChunk> Iterator for Fragments<C> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.inner.next() {
                Some(Ok(chunk)) => {
                    if let Some(text) = self.filter.accept(chunk) {
                        trace!(len = text.len(), "Stream fragment");
                        return Some(Ok(text));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

impl<C: StreamChunk> FusedIterator for Fragments<C> {}

impl<C> fmt::Debug for Fragments<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragments")
            .field("started", &self.filter.started)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// Lazy, single-pass fragment stream for async callers
///
/// Each poll that reaches the vendor stream is a suspension point; nothing is
/// buffered beyond the chunk currently being inspected.
pub struct AsyncFragments<C> {
    inner: ChunkStream<C>,
    filter: FragmentFilter,
    done: bool,
}

impl<C: StreamChunk> AsyncFragments<C> {
    /// Wrap a raw chunk stream
    pub fn new(inner: impl Stream<Item = Result<C>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(inner),
            filter: FragmentFilter::default(),
            done: false,
        }
    }

    /// The last usage report seen so far
    pub fn usage(&self) -> Option<&Usage> {
        self.filter.usage.as_ref()
    }
}

impl<C: StreamChunk> Stream for AsyncFragments<C> {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if let Some(text) = self.filter.accept(chunk) {
                        trace!(len = text.len(), "Stream fragment");
                        return Poll::Ready(Some(Ok(text)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    self.done = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<C: StreamChunk> FusedStream for AsyncFragments<C> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl<C> fmt::Debug for AsyncFragments<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFragments")
            .field("started", &self.filter.started)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use futures::StreamExt;
    use pretty_assertions::assert_eq;

    /// A structured delta that may carry no text at all
    struct Delta(Option<&'static str>);

    impl StreamChunk for Delta {
        fn into_fragment(self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    /// A plain text delta that reports usage on the final chunk
    struct Text(&'static str, Option<Usage>);

    impl StreamChunk for Text {
        fn into_fragment(self) -> Option<String> {
            Some(self.0.to_string())
        }

        fn usage(&self) -> Option<Usage> {
            self.1.clone()
        }
    }

    fn deltas(items: Vec<Option<&'static str>>) -> Vec<Result<Delta>> {
        items.into_iter().map(|t| Ok(Delta(t))).collect()
    }

    fn collect(fragments: Fragments<Delta>) -> Vec<String> {
        fragments.map(|f| f.unwrap()).collect()
    }

    #[test]
    fn test_skips_leading_empty_chunks() {
        let fragments = Fragments::new(deltas(vec![Some(""), None, Some("Hello")]).into_iter());
        assert_eq!(collect(fragments), vec!["Hello"]);
    }

    #[test]
    fn test_first_fragment_left_trimmed_only() {
        let fragments = Fragments::new(
            deltas(vec![Some(" Hello"), Some(" world"), Some("! ")]).into_iter(),
        );
        assert_eq!(collect(fragments), vec!["Hello", " world", "! "]);
    }

    #[test]
    fn test_whitespace_only_leading_chunk_is_skipped() {
        let fragments = Fragments::new(deltas(vec![Some("  "), Some("\nHi")]).into_iter());
        assert_eq!(collect(fragments), vec!["Hi"]);
    }

    #[test]
    fn test_drops_later_empty_and_null_fragments() {
        let fragments = Fragments::new(
            deltas(vec![Some("a"), None, Some(""), Some("b"), None]).into_iter(),
        );
        assert_eq!(collect(fragments), vec!["a", "b"]);
    }

    #[test]
    fn test_exhausted_before_content_is_empty() {
        let fragments = Fragments::new(deltas(vec![None, Some(""), Some(" ")]).into_iter());
        assert!(collect(fragments).is_empty());

        let fragments = Fragments::new(Vec::<Result<Delta>>::new().into_iter());
        assert!(collect(fragments).is_empty());
    }

    #[test]
    fn test_error_after_partial_delivery() {
        let chunks = vec![
            Ok(Delta(Some("Hel"))),
            Ok(Delta(Some("lo"))),
            Err(Error::vendor("test", "connection dropped")),
            Ok(Delta(Some("never"))),
        ];
        let mut fragments = Fragments::new(chunks.into_iter());

        assert_eq!(fragments.next().unwrap().unwrap(), "Hel");
        assert_eq!(fragments.next().unwrap().unwrap(), "lo");
        assert!(fragments.next().unwrap().unwrap_err().is_vendor());
        assert!(fragments.next().is_none());
    }

    #[test]
    fn test_pulls_only_as_far_as_needed() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let source = deltas(vec![None, Some("first"), Some("second"), Some("third")])
            .into_iter()
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let mut fragments = Fragments::new(source);
        assert_eq!(fragments.next().unwrap().unwrap(), "first");
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_usage_is_tracked() {
        let usage = Usage::new(10, 3);
        let chunks = vec![Ok(Text("Hi", None)), Ok(Text("", Some(usage.clone())))];
        let mut fragments = Fragments::new(chunks.into_iter());

        assert!(fragments.usage().is_none());
        assert_eq!(fragments.by_ref().count(), 1);
        assert_eq!(fragments.usage(), Some(&usage));
    }

    #[tokio::test]
    async fn test_async_matches_blocking() {
        let items = vec![Some(""), None, Some(" The"), Some(" answer"), None, Some(" is 42.")];

        let blocking: Vec<String> = collect(Fragments::new(deltas(items.clone()).into_iter()));
        let nonblocking: Vec<String> =
            AsyncFragments::new(futures::stream::iter(deltas(items)))
                .map(|f| f.unwrap())
                .collect()
                .await;

        assert_eq!(blocking, nonblocking);
        assert_eq!(nonblocking.concat(), "The answer is 42.");
    }

    #[tokio::test]
    async fn test_async_error_after_partial_delivery() {
        let chunks = vec![
            Ok(Delta(Some("Hel"))),
            Ok(Delta(Some("lo"))),
            Err(Error::vendor("test", "connection dropped")),
        ];
        let mut fragments = AsyncFragments::new(futures::stream::iter(chunks));

        assert_eq!(fragments.next().await.unwrap().unwrap(), "Hel");
        assert_eq!(fragments.next().await.unwrap().unwrap(), "lo");
        assert!(fragments.next().await.unwrap().is_err());
        assert!(fragments.next().await.is_none());
        assert!(fragments.is_terminated());
    }
}
