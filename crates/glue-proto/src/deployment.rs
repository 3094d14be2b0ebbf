//! Deployment and build-step types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DeploymentId, GlueId};

/// Overall status of a deployment.
///
/// `Pending` is the only non-terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Build or registration still in progress.
    Pending,
    /// Deployment is live.
    Success,
    /// Build or registration failed.
    Failure,
    /// Deployment was cancelled or superseded.
    Cancelled,
}

impl DeploymentStatus {
    /// Returns true for every status other than `Pending`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Status of a single build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not started yet.
    Pending,
    /// Currently running.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Failure,
    /// Not run.
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// One phase of a deployment's build/registration pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    /// Machine name of the step (e.g. `bundle`).
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Step status.
    pub status: StepStatus,
    /// Log text emitted by the step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// When the step started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the step ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl BuildStep {
    /// Creates a step with no text or timestamps.
    #[must_use]
    pub fn new(name: impl Into<String>, title: impl Into<String>, status: StepStatus) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            status,
            text: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// Sets the step's log text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A deployment record as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment identifier.
    pub id: DeploymentId,
    /// Glue this deployment belongs to.
    pub glue_id: GlueId,
    /// Overall status.
    pub status: DeploymentStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time the deployment reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// One fetched, immutable view of a deployment and its build steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSnapshot {
    /// The deployment record.
    #[serde(flatten)]
    pub deployment: Deployment,
    /// Ordered build steps.
    #[serde(default)]
    pub steps: Vec<BuildStep>,
}

impl DeploymentSnapshot {
    /// Overall status of the snapshot.
    #[must_use]
    pub const fn status(&self) -> DeploymentStatus {
        self.deployment.status
    }
}

/// Request body for uploading a new deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeployment {
    /// File name of the script entry point.
    pub file_name: String,
    /// Script source.
    pub code: String,
}
