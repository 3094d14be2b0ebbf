//! Deploy command implementation.
//!
//! Uploads a single script file as a new deployment and, unless told not to,
//! follows it until the build finishes.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use glue_proto::{CreateDeployment, DeploymentId, DeploymentSnapshot, DeploymentStatus, GlueId};
use glue_stream::{watch_deployment, StreamError, WatchConfig};
use tracing::{debug, info};

use crate::cli::DeployArgs;
use crate::client::GlueApi;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Deploy command executor.
pub struct DeployCommand<'a, C> {
    client: &'a C,
    watch_interval: Duration,
}

impl<'a, C: GlueApi> DeployCommand<'a, C> {
    /// Create a new deploy command polling every `watch_interval`.
    #[must_use]
    pub const fn new(client: &'a C, watch_interval: Duration) -> Self {
        Self {
            client,
            watch_interval,
        }
    }

    /// Upload `args.file` and optionally follow the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the upload fails, or the
    /// deployment ends without success.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &DeployArgs,
    ) -> Result<(), CliError> {
        let glue_id = GlueId::parse(&args.glue)?;
        let body = read_script(&args.file).await?;
        debug!(glue = %glue_id, file = %body.file_name, bytes = body.code.len(), "uploading script");

        let deployment = self.client.create_deployment(&glue_id, &body).await?;
        info!(deployment = %deployment.id, "deployment created");

        if args.no_wait {
            return if format.is_json() {
                format.write(writer, &deployment)
            } else {
                format.write(
                    writer,
                    &Message::success(format!("Deployment {} queued", deployment.id)),
                )
            };
        }

        if !format.is_json() {
            format.write(
                writer,
                &Message::info(format!("Deployment {} started, waiting for build...", deployment.id)),
            )?;
        }
        follow_deployment(self.client, writer, format, deployment.id, self.watch_interval).await?;
        Ok(())
    }
}

/// Prints every change of a deployment until it reaches a terminal status.
///
/// # Errors
///
/// Returns [`CliError::DeploymentFailed`] if the final status is not
/// `success`, or the stream's error if polling fails.
pub async fn follow_deployment<C, W>(
    client: &C,
    writer: &mut W,
    format: &OutputFormat,
    id: DeploymentId,
    interval: Duration,
) -> Result<DeploymentSnapshot, CliError>
where
    C: GlueApi,
    W: Write,
{
    let config = WatchConfig::default().with_interval(interval);
    let watch = watch_deployment(client, id.clone(), config);
    futures::pin_mut!(watch);

    let mut last = None;
    while let Some(snapshot) = watch.next().await {
        let snapshot = snapshot?;
        format.write(writer, &snapshot)?;
        last = Some(snapshot);
    }

    let last = last.ok_or(CliError::Stream(StreamError::Closed))?;
    match last.status() {
        DeploymentStatus::Success => {
            if !format.is_json() {
                format.write(writer, &Message::success(format!("Deployment {id} is live")))?;
            }
            Ok(last)
        }
        status => Err(CliError::DeploymentFailed {
            id: id.to_string(),
            status: status.to_string(),
        }),
    }
}

async fn read_script(path: &Path) -> Result<CreateDeployment, CliError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidArgument(format!("not a file: {}", path.display())))?
        .to_string();

    let code = tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::InvalidArgument(format!("cannot read {}: {e}", path.display()))
    })?;
    if code.trim().is_empty() {
        return Err(CliError::InvalidArgument(format!("{} is empty", path.display())));
    }

    Ok(CreateDeployment { file_name, code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::client::ApiClient;
    use crate::commands::fake::{deployment, glue, FakeApi};
    use crate::test_support::CannedServer;
    use glue_proto::{BuildStep, StepStatus};
    use tempfile::TempDir;

    fn snapshot(status: DeploymentStatus, step: StepStatus) -> Option<DeploymentSnapshot> {
        Some(DeploymentSnapshot {
            deployment: deployment("dep_1", status),
            steps: vec![BuildStep::new("bundle", "Bundling", step)],
        })
    }

    fn script(dir: &TempDir, contents: &str) -> DeployArgs {
        let file = dir.path().join("main.ts");
        std::fs::write(&file, contents).expect("write script");
        DeployArgs {
            file,
            glue: "g_1".into(),
            no_wait: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_waits_for_success() {
        let dir = TempDir::new().expect("tempdir");
        let api = FakeApi::default()
            .with_glue(glue("g_1", "notifier"))
            .with_snapshots(vec![
                snapshot(DeploymentStatus::Pending, StepStatus::Running),
                snapshot(DeploymentStatus::Pending, StepStatus::Running),
                snapshot(DeploymentStatus::Success, StepStatus::Success),
            ]);

        let mut out = Vec::new();
        DeployCommand::new(&api, Duration::from_secs(1))
            .execute(&mut out, &OutputFormat::default(), &script(&dir, "export default 1"))
            .await
            .expect("deploy");

        let text = String::from_utf8_lossy(&out);
        assert_eq!(text.matches("Deployment dep_1: pending").count(), 1);
        assert!(text.contains("Deployment dep_1: success"));
        assert!(text.contains("✓ Deployment dep_1 is live"));

        let uploads = api.uploads.lock().expect("lock");
        assert_eq!(uploads[0].1.file_name, "main.ts");
        assert_eq!(uploads[0].1.code, "export default 1");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_build_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let api = FakeApi::default()
            .with_glue(glue("g_1", "notifier"))
            .with_snapshots(vec![snapshot(DeploymentStatus::Failure, StepStatus::Failure)]);

        let err = DeployCommand::new(&api, Duration::from_secs(1))
            .execute(&mut Vec::new(), &OutputFormat::default(), &script(&dir, "x"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, CliError::DeploymentFailed { ref status, .. } if status == "failure"));
        assert_eq!(err.exit_code(), crate::error::EXIT_DEPLOYMENT_FAILED);
    }

    #[tokio::test]
    async fn no_wait_returns_after_upload() {
        let dir = TempDir::new().expect("tempdir");
        let api = FakeApi::default().with_glue(glue("g_1", "notifier"));
        let mut args = script(&dir, "x");
        args.no_wait = true;

        let mut out = Vec::new();
        DeployCommand::new(&api, Duration::from_secs(1))
            .execute(&mut out, &OutputFormat::new(Format::Json), &args)
            .await
            .expect("deploy");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");
        assert_eq!(value["status"], "pending");
    }

    #[tokio::test]
    async fn empty_script_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let api = FakeApi::default().with_glue(glue("g_1", "notifier"));

        let err = DeployCommand::new(&api, Duration::from_secs(1))
            .execute(&mut Vec::new(), &OutputFormat::default(), &script(&dir, "  \n"))
            .await
            .expect_err("empty");

        assert!(matches!(err, CliError::InvalidArgument(_)));
        assert!(api.uploads.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let api = FakeApi::default();
        let args = DeployArgs {
            file: "/nonexistent/main.ts".into(),
            glue: "g_1".into(),
            no_wait: true,
        };

        let err = DeployCommand::new(&api, Duration::from_secs(1))
            .execute(&mut Vec::new(), &OutputFormat::default(), &args)
            .await
            .expect_err("missing");
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn expired_token_while_following_is_an_auth_error() {
        let server =
            CannedServer::start(vec![(401, r#"{"message":"token expired"}"#.into())]).await;
        let client =
            ApiClient::new(&server.url(), Some("tok_old".into()), Duration::from_secs(5))
                .expect("client");

        let err = follow_deployment(
            &client,
            &mut Vec::new(),
            &OutputFormat::default(),
            DeploymentId::parse("dep_1").expect("valid"),
            Duration::from_secs(1),
        )
        .await
        .expect_err("401");

        assert!(matches!(err, CliError::Stream(StreamError::Unauthorized(ref m)) if m == "token expired"));
        assert_eq!(err.exit_code(), crate::error::EXIT_AUTH);
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_deployment_is_not_found() {
        let api = FakeApi::default().with_snapshots(vec![
            snapshot(DeploymentStatus::Pending, StepStatus::Running),
            None,
        ]);

        let err = follow_deployment(
            &api,
            &mut Vec::new(),
            &OutputFormat::default(),
            DeploymentId::parse("dep_1").expect("valid"),
            Duration::from_secs(1),
        )
        .await
        .expect_err("gone");

        assert_eq!(err.exit_code(), crate::error::EXIT_NOT_FOUND);
    }
}
