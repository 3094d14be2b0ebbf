//! The release protocol for borrowed streams.
//!
//! A source handed to [`crate::debounce`] stays owned by its creator in
//! spirit: the debouncer only takes custody while iterating. When iteration
//! ends early (the consumer drops the debouncer, or the source fails) the
//! debouncer calls [`Release::release`] exactly once. A source that has
//! already returned `None` is never released.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::{Stream, TryStream};
use tracing::trace;

use crate::debounce::Debounce;

/// A stream that holds a resource which must be given back when the
/// consumer stops early.
pub trait Release {
    /// Releases the underlying resource.
    ///
    /// Called at most once, and never after the stream returned `None`.
    fn release(&mut self);
}

impl<S: Release + ?Sized> Release for Box<S> {
    fn release(&mut self) {
        (**self).release();
    }
}

/// Completion state of a source in custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Still producing items.
    Active,
    /// Returned `None`; must not be released.
    Completed,
    /// Released by the custodian.
    Released,
}

/// Holds a source together with its completion flag and releases it on drop
/// if it is still active.
#[derive(Debug)]
pub(crate) struct Custody<S: Release> {
    source: S,
    state: SourceState,
}

impl<S: Release> Custody<S> {
    pub(crate) const fn new(source: S) -> Self {
        Self {
            source,
            state: SourceState::Active,
        }
    }

    pub(crate) const fn state(&self) -> SourceState {
        self.state
    }

    pub(crate) fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub(crate) fn mark_completed(&mut self) {
        if self.state == SourceState::Active {
            self.state = SourceState::Completed;
        }
    }

    /// Releases the source if it is still active. Returns whether a release happened.
    pub(crate) fn release(&mut self) -> bool {
        if self.state != SourceState::Active {
            return false;
        }
        self.state = SourceState::Released;
        trace!("releasing source");
        self.source.release();
        true
    }
}

impl<S: Release> Drop for Custody<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Wraps a plain stream whose release is a no-op.
#[derive(Debug, Clone)]
pub struct Unreleased<S> {
    inner: S,
}

impl<S> Unreleased<S> {
    /// Wraps `inner`.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Release for Unreleased<S> {
    fn release(&mut self) {}
}

impl<S: Stream + Unpin> Stream for Unreleased<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Wraps a stream and runs a hook when it is released.
pub struct OnRelease<S, F> {
    inner: S,
    hook: Option<F>,
}

impl<S, F: FnOnce()> OnRelease<S, F> {
    /// Wraps `inner`, running `hook` on release.
    #[must_use]
    pub const fn new(inner: S, hook: F) -> Self {
        Self {
            inner,
            hook: Some(hook),
        }
    }
}

impl<S, F> std::fmt::Debug for OnRelease<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnRelease")
            .field("released", &self.hook.is_none())
            .finish_non_exhaustive()
    }
}

impl<S, F: FnOnce()> Release for OnRelease<S, F> {
    fn release(&mut self) {
        if let Some(hook) = self.hook.take() {
            hook();
        }
    }
}

impl<S: Stream + Unpin, F: Unpin> Stream for OnRelease<S, F> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Combinators for building and debouncing sources.
pub trait SourceExt: Stream + Sized {
    /// Treats this stream as a source with nothing to release.
    fn unreleased(self) -> Unreleased<Self> {
        Unreleased::new(self)
    }

    /// Runs `hook` if this stream is released before it completes.
    fn on_release<F: FnOnce()>(self, hook: F) -> OnRelease<Self, F> {
        OnRelease::new(self, hook)
    }

    /// Coalesces items into batches separated by `wait` of quiet time.
    fn debounce(self, wait: Duration) -> Debounce<Self>
    where
        Self: TryStream + Release + Unpin,
    {
        Debounce::new(self, wait)
    }
}

impl<S: Stream> SourceExt for S {}
