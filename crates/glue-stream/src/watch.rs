//! Polling change stream for deployments.
//!
//! [`watch_deployment`] repeatedly fetches a deployment snapshot and yields
//! it only when its progress changed since the last yielded snapshot,
//! finishing after the first snapshot with a terminal status.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, Stream};
use glue_proto::{BuildStep, DeploymentId, DeploymentSnapshot};
use tracing::{debug, trace};

use crate::error::{StreamError, StreamResult};

/// Default delay between two fetches.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Fetches the current snapshot of a deployment.
pub trait DeploymentFetcher: Send + Sync {
    /// Fetches the deployment and its build steps.
    ///
    /// Returns `Ok(None)` if the deployment does not exist.
    fn fetch_deployment_with_logs(
        &self,
        id: &DeploymentId,
    ) -> impl Future<Output = StreamResult<Option<DeploymentSnapshot>>> + Send;
}

impl<F: DeploymentFetcher + ?Sized> DeploymentFetcher for &F {
    fn fetch_deployment_with_logs(
        &self,
        id: &DeploymentId,
    ) -> impl Future<Output = StreamResult<Option<DeploymentSnapshot>>> + Send {
        (**self).fetch_deployment_with_logs(id)
    }
}

impl<F: DeploymentFetcher + ?Sized> DeploymentFetcher for Arc<F> {
    fn fetch_deployment_with_logs(
        &self,
        id: &DeploymentId,
    ) -> impl Future<Output = StreamResult<Option<DeploymentSnapshot>>> + Send {
        (**self).fetch_deployment_with_logs(id)
    }
}

/// Settings for [`watch_deployment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    /// Delay between two fetches.
    pub interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WATCH_INTERVAL,
        }
    }
}

impl WatchConfig {
    /// Sets the poll interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Returns true if two snapshots show the same progress.
///
/// Compares the overall status and, pairwise and in order, each step's name,
/// title and status. Step text and timestamps are ignored.
#[must_use]
pub fn same_progress(a: &DeploymentSnapshot, b: &DeploymentSnapshot) -> bool {
    a.status() == b.status()
        && a.steps.len() == b.steps.len()
        && a.steps.iter().zip(&b.steps).all(|(x, y)| same_step(x, y))
}

fn same_step(a: &BuildStep, b: &BuildStep) -> bool {
    a.name == b.name && a.title == b.title && a.status == b.status
}

struct WatchState<F> {
    fetcher: F,
    id: DeploymentId,
    config: WatchConfig,
    last: Option<DeploymentSnapshot>,
    fetches: u64,
}

impl<F: DeploymentFetcher> WatchState<F> {
    async fn next_change(&mut self) -> StreamResult<DeploymentSnapshot> {
        loop {
            if self.fetches > 0 {
                tokio::time::sleep(self.config.interval).await;
            }
            self.fetches += 1;

            let Some(snapshot) = self.fetcher.fetch_deployment_with_logs(&self.id).await? else {
                debug!(deployment = %self.id, "deployment disappeared");
                return Err(StreamError::NotFound(self.id.to_string()));
            };

            if let Some(last) = &self.last {
                if same_progress(last, &snapshot) {
                    trace!(deployment = %self.id, fetches = self.fetches, "no change");
                    continue;
                }
            }

            debug!(
                deployment = %self.id,
                status = %snapshot.status(),
                steps = snapshot.steps.len(),
                "deployment changed"
            );
            self.last = Some(snapshot.clone());
            return Ok(snapshot);
        }
    }
}

/// Watches a deployment until it reaches a terminal status.
///
/// The first fetched snapshot is always yielded; later ones only when
/// [`same_progress`] says they differ from the previous yield. The stream ends
/// right after yielding a terminal snapshot. A missing deployment yields
/// [`StreamError::NotFound`] and a failed fetch yields its error; both end the
/// stream. Fetches are not retried.
///
/// Dropping the stream stops polling.
pub fn watch_deployment<F>(
    fetcher: F,
    id: DeploymentId,
    config: WatchConfig,
) -> impl Stream<Item = StreamResult<DeploymentSnapshot>>
where
    F: DeploymentFetcher,
{
    let state = WatchState {
        fetcher,
        id,
        config,
        last: None,
        fetches: 0,
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        match state.next_change().await {
            Ok(snapshot) => {
                let next = if snapshot.status().is_terminal() {
                    debug!(deployment = %state.id, status = %snapshot.status(), "watch finished");
                    None
                } else {
                    Some(state)
                };
                Some((Ok(snapshot), next))
            }
            Err(err) => Some((Err(err), None)),
        }
    })
}
