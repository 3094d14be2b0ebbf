//! Deployment inspection.

use std::io::Write;
use std::time::Duration;

use glue_proto::{DeploymentId, GlueId};

use crate::cli::DeploymentCommands;
use crate::client::GlueApi;
use crate::commands::deploy::follow_deployment;
use crate::error::CliError;
use crate::output::{DeploymentList, OutputFormat};

/// Deployments command executor.
pub struct DeploymentsCommand<'a, C> {
    client: &'a C,
    watch_interval: Duration,
}

impl<'a, C: GlueApi> DeploymentsCommand<'a, C> {
    /// Create a new deployments command.
    #[must_use]
    pub const fn new(client: &'a C, watch_interval: Duration) -> Self {
        Self {
            client,
            watch_interval,
        }
    }

    /// Execute a deployments subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or a watched deployment does not
    /// succeed.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &DeploymentCommands,
    ) -> Result<(), CliError> {
        match command {
            DeploymentCommands::List { glue } => {
                let deployments = self.client.list_deployments(&GlueId::parse(glue)?).await?;
                format.write(writer, &DeploymentList { deployments })?;
            }
            DeploymentCommands::Watch { deployment } => {
                let id = DeploymentId::parse(deployment)?;
                follow_deployment(self.client, writer, format, id, self.watch_interval).await?;
            }
        }
        Ok(())
    }
}
