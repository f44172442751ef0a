//! Scoped wall-clock timing for vendor calls

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const UNSET: u64 = u64::MAX;

/// The most recently observed call latency of one provider instance
///
/// This is a diagnostic convenience only. Under concurrent use it reflects
/// whichever call finished last; the latency of a specific call is reported
/// in that call's [`CompletionMeta`](crate::CompletionMeta).
#[derive(Debug)]
pub struct LastLatency(AtomicU64);

impl LastLatency {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self(AtomicU64::new(UNSET))
    }

    /// The last recorded latency, if any call has reached the vendor
    pub fn get(&self) -> Option<Duration> {
        match self.0.load(Ordering::Relaxed) {
            UNSET => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }

    fn set(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(UNSET - 1);
        self.0.store(nanos, Ordering::Relaxed);
    }
}

impl Default for LastLatency {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard measuring the time between its creation and its end
///
/// [`LatencyTracker::finish`] returns the elapsed time and records it. If the
/// guard is dropped without finishing (an error was propagated or the future
/// holding it was cancelled) the elapsed time is still recorded.
#[derive(Debug)]
pub struct LatencyTracker<'a> {
    start: Instant,
    sink: &'a LastLatency,
    recorded: bool,
}

impl<'a> LatencyTracker<'a> {
    /// Start timing
    pub fn start(sink: &'a LastLatency) -> Self {
        Self {
            start: Instant::now(),
            sink,
            recorded: false,
        }
    }

    /// Stop timing and return the elapsed wall-clock time
    pub fn finish(mut self) -> Duration {
        let elapsed = self.start.elapsed();
        self.sink.set(elapsed);
        self.recorded = true;
        elapsed
    }
}

impl Drop for LatencyTracker<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            self.sink.set(self.start.elapsed());
        }
    }
}
