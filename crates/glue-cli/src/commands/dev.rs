//! Dev session: forwards remote trigger events to a local runtime.
//!
//! The CLI attaches to the glue's dev WebSocket, POSTs every event payload to
//! the local target and answers the server with the delivery result.

use std::future::Future;
use std::io::Write;

use futures::{SinkExt, StreamExt};
use glue_proto::{DevMessage, GlueId, TriggerEvent, TriggerResult};
use tokio::process::{Child, Command};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

use crate::cli::DevArgs;
use crate::client::ApiClient;
use crate::commands::shutdown;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Header carrying the trigger kind on forwarded requests.
pub const TRIGGER_HEADER: &str = "x-glue-trigger";
/// Header carrying the event ID on forwarded requests.
pub const EVENT_ID_HEADER: &str = "x-glue-event-id";

/// Delivers trigger events to the local runtime over HTTP.
#[derive(Debug, Clone)]
pub struct Forwarder {
    http: reqwest::Client,
    target: Url,
}

impl Forwarder {
    /// Create a forwarder posting to `target`.
    #[must_use]
    pub fn new(target: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            target,
        }
    }

    /// POSTs the event payload and reports what the runtime answered.
    ///
    /// Delivery failures are reported in the result, never as an error.
    pub async fn deliver(&self, event: &TriggerEvent) -> TriggerResult {
        let response = self
            .http
            .post(self.target.clone())
            .header(TRIGGER_HEADER, event.trigger.as_str())
            .header(EVENT_ID_HEADER, event.id.as_str())
            .json(&event.payload)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.ok().filter(|b| !b.is_empty());
                debug!(event = %event.id, status, "event delivered");
                TriggerResult {
                    event_id: event.id.clone(),
                    status: Some(status),
                    body,
                }
            }
            Err(err) => {
                warn!(event = %event.id, error = %err, "event delivery failed");
                TriggerResult {
                    event_id: event.id.clone(),
                    status: None,
                    body: Some(err.to_string()),
                }
            }
        }
    }
}

/// Dev command executor.
pub struct DevCommand<'a> {
    client: &'a ApiClient,
}

impl<'a> DevCommand<'a> {
    /// Create a new dev command.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Start the local runtime if asked, then forward events until Ctrl-C or
    /// the server ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are invalid, the runtime cannot be
    /// started or the session fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &DevArgs,
    ) -> Result<(), CliError> {
        let glue_id = GlueId::parse(&args.glue)?;
        let target = parse_target(&args.target)?;

        let _runtime = match args.exec.as_deref() {
            Some(command) => Some(spawn_runtime(command)?),
            None => None,
        };

        let forwarded = self
            .run(writer, format, &glue_id, Forwarder::new(target), shutdown::ctrl_c())
            .await?;
        info!(forwarded, "dev session ended");
        Ok(())
    }

    /// Runs one dev session. Returns the number of events forwarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebSocket cannot be opened or fails.
    pub async fn run<W, F>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        glue_id: &GlueId,
        forwarder: Forwarder,
        shutdown: F,
    ) -> Result<u64, CliError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let url = self.client.dev_session_url(glue_id)?;
        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = self.client.token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| CliError::Config(format!("token is not a valid header: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        debug!(%url, "opening dev session");
        let (ws, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut sink, mut frames) = ws.split();
        futures::pin_mut!(shutdown);

        let mut forwarded = 0u64;
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
                frame = frames.next() => {
                    let Some(frame) = frame else { break };
                    let text = match frame? {
                        WsMessage::Text(text) => text,
                        WsMessage::Close(_) => break,
                        _ => continue,
                    };

                    match DevMessage::from_json(&text) {
                        Ok(DevMessage::Ready { session_id }) => {
                            format.write(
                                writer,
                                &Message::info(format!(
                                    "Dev session {session_id} ready, forwarding to {}",
                                    forwarder.target
                                )),
                            )?;
                        }
                        Ok(DevMessage::Event(event)) => {
                            let result = forwarder.deliver(&event).await;
                            let outcome = result
                                .status
                                .map_or_else(|| "delivery failed".to_string(), |s| s.to_string());
                            format.write(
                                writer,
                                &Message::info(format!("{} {} -> {outcome}", event.trigger, event.id)),
                            )?;

                            let reply = DevMessage::Result(result).to_json()?;
                            sink.send(WsMessage::Text(reply.into())).await?;
                            forwarded += 1;
                        }
                        Ok(DevMessage::Closed { reason }) => {
                            let reason = reason.unwrap_or_else(|| "no reason given".to_string());
                            format.write(writer, &Message::info(format!("Session closed: {reason}")))?;
                            break;
                        }
                        Ok(DevMessage::Result(_)) => {
                            warn!("server sent a result frame, ignoring");
                        }
                        Err(err) => {
                            warn!(error = %err, "ignoring unknown frame");
                        }
                    }
                }
            }
        }

        Ok(forwarded)
    }
}

fn parse_target(target: &str) -> Result<Url, CliError> {
    let url = Url::parse(target)
        .map_err(|e| CliError::InvalidArgument(format!("invalid target '{target}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CliError::InvalidArgument(format!(
            "target must be an http(s) URL, got '{target}'"
        )));
    }
    Ok(url)
}

/// Starts the user's runtime through the shell. The child is killed when
/// the returned handle is dropped.
fn spawn_runtime(command: &str) -> Result<Child, CliError> {
    #[cfg(unix)]
    let mut cmd = {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    };
    #[cfg(windows)]
    let mut cmd = {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    };

    let child = cmd
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CliError::InvalidArgument(format!("failed to start `{command}`: {e}")))?;
    info!(command, pid = child.id(), "started local runtime");
    Ok(child)
}
