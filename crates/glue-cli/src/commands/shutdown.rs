//! Ctrl-C handling for long-running commands.

use std::future::{pending, Future};
use std::io;

use tracing::warn;

/// Resolves on Ctrl-C.
///
/// If the handler cannot be installed the failure is logged and the future
/// never resolves, so the command runs until it ends on its own.
pub async fn ctrl_c() {
    wait_for(tokio::signal::ctrl_c()).await;
}

pub(crate) async fn wait_for<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal.await {
        warn!(error = %err, "cannot listen for Ctrl-C");
        pending::<()>().await;
    }
}
