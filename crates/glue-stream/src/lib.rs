//! # glue-stream
//!
//! Streaming core of the glue CLI.
//!
//! This crate provides:
//! - [`debounce`]: coalesces a fallible source stream into batches separated
//!   by a quiet period, releasing the source on every early exit
//! - [`watch_deployment`]: polls a deployment and yields a snapshot only when
//!   its progress changes, ending at a terminal status
//! - [`LogTail`]: a background log poller usable as a debounce source
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use futures::{stream, StreamExt};
//! use glue_stream::SourceExt;
//!
//! # async fn demo() {
//! let source = stream::iter([Ok::<_, std::io::Error>(1), Ok(2), Ok(3)]).unreleased();
//! let batches: Vec<_> = source.debounce(Duration::from_millis(100)).collect().await;
//! assert_eq!(batches.len(), 1);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod debounce;
pub mod error;
pub mod source;
pub mod tail;
pub mod watch;

pub use debounce::{debounce, Debounce};
pub use error::{StreamError, StreamResult};
pub use source::{OnRelease, Release, SourceExt, SourceState, Unreleased};
pub use tail::{LogFetcher, LogTail, TailConfig};
pub use watch::{same_progress, watch_deployment, DeploymentFetcher, WatchConfig};
