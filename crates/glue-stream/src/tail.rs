//! Background log polling.
//!
//! [`LogTail`] owns a spawned task that pages through a glue's execution logs
//! and forwards every entry over a bounded channel. It is a [`Release`]
//! source, so it can be handed straight to [`crate::debounce`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use glue_proto::{GlueId, LogEntry, LogPage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::StreamResult;
use crate::source::Release;

/// Fetches pages of execution logs.
pub trait LogFetcher: Send + Sync {
    /// Fetches up to `limit` entries after `cursor` (from the start if `None`).
    fn fetch_logs(
        &self,
        glue_id: &GlueId,
        cursor: Option<&str>,
        limit: u32,
    ) -> impl Future<Output = StreamResult<LogPage>> + Send;
}

impl<F: LogFetcher + ?Sized> LogFetcher for Arc<F> {
    fn fetch_logs(
        &self,
        glue_id: &GlueId,
        cursor: Option<&str>,
        limit: u32,
    ) -> impl Future<Output = StreamResult<LogPage>> + Send {
        (**self).fetch_logs(glue_id, cursor, limit)
    }
}

/// Settings for [`LogTail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailConfig {
    /// Delay between polls once caught up.
    pub interval: Duration,
    /// Keep polling after the backlog is drained.
    pub follow: bool,
    /// Page size requested from the backend.
    pub limit: u32,
    /// Channel capacity between the poller and the consumer.
    pub buffer: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            follow: false,
            limit: 100,
            buffer: 256,
        }
    }
}

impl TailConfig {
    /// Sets the poll interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets whether to keep polling for new entries.
    #[must_use]
    pub const fn with_follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// A stream of log entries fed by a background poller.
///
/// Completes once the poller stops: after the backlog when not following, or
/// after forwarding a fetch error. The next page is requested right away only
/// while pages bring entries and a new cursor; otherwise the poller waits
/// `interval`. Releasing or dropping the tail aborts the
/// poller.
#[derive(Debug)]
pub struct LogTail {
    rx: mpsc::Receiver<StreamResult<LogEntry>>,
    task: JoinHandle<()>,
}

impl LogTail {
    /// Spawns the poller on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F>(fetcher: Arc<F>, glue_id: GlueId, config: TailConfig) -> Self
    where
        F: LogFetcher + 'static,
    {
        let (tx, rx) = mpsc::channel(config.buffer.max(1));
        let task = tokio::spawn(poll_logs(fetcher, glue_id, config, tx));
        Self { rx, task }
    }

    /// Returns true once the poller task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Stream for LogTail {
    type Item = StreamResult<LogEntry>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Release for LogTail {
    fn release(&mut self) {
        debug!("stopping log poller");
        self.task.abort();
        self.rx.close();
    }
}

impl Drop for LogTail {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_logs<F: LogFetcher>(
    fetcher: Arc<F>,
    glue_id: GlueId,
    config: TailConfig,
    tx: mpsc::Sender<StreamResult<LogEntry>>,
) {
    let mut cursor: Option<String> = None;

    loop {
        let page = match fetcher.fetch_logs(&glue_id, cursor.as_deref(), config.limit).await {
            Ok(page) => page,
            Err(err) => {
                debug!(glue = %glue_id, error = %err, "log fetch failed");
                let _ = tx.send(Err(err)).await;
                return;
            }
        };

        trace!(
            glue = %glue_id,
            entries = page.entries.len(),
            has_more = page.has_more,
            "fetched log page"
        );

        let received = page.entries.len();
        for entry in page.entries {
            if tx.send(Ok(entry)).await.is_err() {
                trace!(glue = %glue_id, "log consumer went away");
                return;
            }
        }

        let advanced = page
            .cursor
            .as_deref()
            .is_some_and(|next| cursor.as_deref() != Some(next));
        if advanced {
            cursor = page.cursor;
        }

        if page.has_more {
            if advanced && received > 0 {
                continue;
            }
            debug!(glue = %glue_id, received, "more logs reported without progress");
        }
        if !config.follow {
            debug!(glue = %glue_id, "log backlog drained");
            return;
        }
        tokio::time::sleep(config.interval).await;
    }
}
