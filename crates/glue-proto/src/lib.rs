//! # glue-proto
//!
//! Wire types for the glue platform API.
//!
//! These types mirror the JSON bodies returned by the backend and are shared
//! between the CLI's HTTP client and the streaming core in `glue-stream`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod deployment;
pub mod error;
pub mod glue;
pub mod logs;
pub mod tags;
pub mod trigger;
pub mod types;

pub use deployment::{
    BuildStep, CreateDeployment, Deployment, DeploymentSnapshot, DeploymentStatus, StepStatus,
};
pub use error::ProtoError;
pub use glue::{CreateGlue, Glue, User};
pub use logs::{LogEntry, LogLevel, LogPage};
pub use tags::{normalize_tag, normalize_tags};
pub use trigger::{DevMessage, TriggerEvent, TriggerResult};
pub use types::{DeploymentId, EventId, GlueId};
