//! # glue-cli
//!
//! Command-line client for the glue automation platform.
//!
//! Provides commands for:
//! - Authentication and stored credentials
//! - Creating, listing, archiving and tagging glues
//! - Deploying a script and following the build
//! - Reading and following execution logs
//! - Forwarding live trigger events to a local runtime
//!
//! # Architecture
//!
//! Commands are written against the [`client::GlueApi`] trait and talk to
//! the backend through [`client::ApiClient`]. Long-running output comes from
//! the streams in `glue-stream`:
//!
//! ```text
//! ┌──────────┐  watch_deployment / LogTail  ┌─────────────┐   HTTP/WS   ┌─────────┐
//! │ commands │◄────────────────────────────│  ApiClient  │◄───────────►│ backend │
//! └──────────┘        (debounce)           └─────────────┘             └─────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

#[cfg(test)]
mod test_support;

pub use cli::{Cli, Commands, Format};
pub use client::{ApiClient, GlueApi};
pub use config::{ConfigPaths, Credentials, GlueConfig, Settings};
pub use error::CliError;
pub use output::OutputFormat;
