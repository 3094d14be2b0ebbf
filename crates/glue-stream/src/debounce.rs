//! Quiet-period batching over any fallible stream.
//!
//! [`Debounce`] collects items from a source into a buffer and flushes the
//! buffer as one batch once `wait` has passed without a new item, or as soon
//! as the source completes. It cycles between two states:
//!
//! - *collecting*: the buffer is non-empty and a quiet-period timer is armed
//!   for `last item + wait`; each new item re-arms it.
//! - *waiting*: the buffer is empty and no timer exists.
//!
//! When the timer wins the race the batch is flushed and the timer is dropped,
//! so a stale deadline can never flush the next cycle early.
//!
//! ```text
//! source:  1 2 . 3 . . . . . . 4 5 |
//! batches:           [1, 2, 3]      [4, 5]
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::FusedStream;
use futures::{Stream, TryStream, TryStreamExt};
use tokio::time::{sleep_until, Instant, Sleep};
use tracing::{debug, trace};

use crate::source::{Custody, Release, SourceState};

/// Items pulled from the source in one `poll_next` before yielding to the
/// executor.
const POLL_BUDGET: usize = 64;

/// Coalesces items from `source` into batches separated by `wait` of quiet time.
///
/// See [`Debounce`] for the exact flushing and release rules.
pub fn debounce<S>(source: S, wait: Duration) -> Debounce<S>
where
    S: TryStream + Release + Unpin,
{
    Debounce::new(source, wait)
}

/// Stream returned by [`debounce`].
///
/// Yields `Ok(batch)` for every flush and ends after the source ends. A source
/// error is yielded once, discards any pending batch, and ends the stream.
/// Batches are never empty and concatenate to the source's item order.
///
/// If the debouncer is dropped, or the source fails, before the source
/// returned `None`, the source is released exactly once.
#[must_use = "streams do nothing unless polled"]
pub struct Debounce<S: TryStream + Release> {
    custody: Custody<S>,
    wait: Duration,
    buffer: Vec<S::Ok>,
    timer: Option<Pin<Box<Sleep>>>,
}

impl<S: TryStream + Release> Debounce<S> {
    /// Creates a debouncer over `source`.
    pub fn new(source: S, wait: Duration) -> Self {
        Self {
            custody: Custody::new(source),
            wait,
            buffer: Vec::new(),
            timer: None,
        }
    }

    /// Quiet period for this debouncer.
    #[must_use]
    pub const fn wait(&self) -> Duration {
        self.wait
    }

    /// Number of items collected but not yet flushed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Completion state of the wrapped source.
    #[must_use]
    pub const fn source_state(&self) -> SourceState {
        self.custody.state()
    }

    fn arm_timer(&mut self) {
        let deadline = Instant::now() + self.wait;
        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().reset(deadline),
            None => self.timer = Some(Box::pin(sleep_until(deadline))),
        }
    }

    fn flush(&mut self) -> Vec<S::Ok> {
        self.timer = None;
        let batch = std::mem::take(&mut self.buffer);
        trace!(len = batch.len(), "flushing batch");
        batch
    }
}

impl<S> Stream for Debounce<S>
where
    S: TryStream + Release + Unpin,
{
    type Item = Result<Vec<S::Ok>, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let mut pulled = 0;

        loop {
            if this.custody.state() != SourceState::Active {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                return Poll::Ready(Some(Ok(this.flush())));
            }

            match this.custody.source_mut().try_poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(item))) => {
                    this.buffer.push(item);
                    this.arm_timer();
                    pulled += 1;
                    if pulled >= POLL_BUDGET {
                        trace!(pending = this.buffer.len(), "poll budget spent");
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    let dropped = this.buffer.len();
                    this.buffer.clear();
                    this.timer = None;
                    this.custody.release();
                    debug!(dropped, "source failed, pending batch discarded");
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    trace!(pending = this.buffer.len(), "source completed");
                    this.custody.mark_completed();
                }
                Poll::Pending => {
                    let elapsed = this
                        .timer
                        .as_mut()
                        .is_some_and(|timer| timer.as_mut().poll(cx).is_ready());
                    if elapsed {
                        return Poll::Ready(Some(Ok(this.flush())));
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}

// Buffered items are never pinned; only the boxed timer is.
impl<S: TryStream + Release + Unpin> Unpin for Debounce<S> {}

impl<S> FusedStream for Debounce<S>
where
    S: TryStream + Release + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.custody.state() != SourceState::Active && self.buffer.is_empty()
    }
}

impl<S> std::fmt::Debug for Debounce<S>
where
    S: TryStream + Release,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounce")
            .field("wait", &self.wait)
            .field("pending", &self.buffer.len())
            .field("timer_armed", &self.timer.is_some())
            .field("source_state", &self.custody.state())
            .finish_non_exhaustive()
    }
}
