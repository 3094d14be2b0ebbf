//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`auth`] - Credential management
//! - [`glue`] - Listing, creating, archiving and tagging glues
//! - [`deploy`] - Script upload and deployment following
//! - [`deployments`] - Deployment inspection
//! - [`logs`] - Log paging and following
//! - [`dev`] - Trigger forwarding to a local runtime
//!
//! [`shutdown`] holds the Ctrl-C wait shared by `logs --follow` and `dev`.

pub mod auth;
pub mod deploy;
pub mod deployments;
pub mod dev;
pub mod glue;
pub mod logs;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod fake;

pub use auth::AuthCommand;
pub use deploy::DeployCommand;
pub use deployments::DeploymentsCommand;
pub use dev::DevCommand;
pub use glue::{GlueCommand, TagOp};
pub use logs::LogsCommand;
