//! Logs command implementation.
//!
//! Without `--follow` this prints one page. With it, a [`LogTail`] polls in
//! the background and its entries are debounced into batches so bursts of
//! lines are written together.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use glue_proto::GlueId;
use glue_stream::{LogTail, SourceExt, TailConfig};
use tracing::debug;

use crate::cli::LogsArgs;
use crate::client::GlueApi;
use crate::commands::shutdown;
use crate::error::CliError;
use crate::output::{LogLines, Message, OutputFormat};

/// Logs command executor.
pub struct LogsCommand<C> {
    client: Arc<C>,
    poll_interval: Duration,
    debounce: Duration,
}

impl<C: GlueApi + 'static> LogsCommand<C> {
    /// Create a new logs command.
    #[must_use]
    pub const fn new(client: Arc<C>, poll_interval: Duration, debounce: Duration) -> Self {
        Self {
            client,
            poll_interval,
            debounce,
        }
    }

    /// Print logs, following until Ctrl-C if requested.
    ///
    /// # Errors
    ///
    /// Returns an error if a fetch fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &LogsArgs,
    ) -> Result<(), CliError> {
        let glue_id = GlueId::parse(&args.glue)?;
        if args.follow {
            self.follow(writer, format, glue_id, args.limit, shutdown::ctrl_c())
                .await
        } else {
            self.page(writer, format, &glue_id, args.limit).await
        }
    }

    async fn page<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        glue_id: &GlueId,
        limit: u32,
    ) -> Result<(), CliError> {
        let page = self.client.logs_page(glue_id, None, limit).await?;
        if page.entries.is_empty() && !format.is_json() {
            return format.write(writer, &Message::info("No logs yet"));
        }
        format.write(writer, &LogLines { entries: page.entries })
    }

    /// Streams batches of new entries until `shutdown` resolves or polling fails.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error.
    pub async fn follow<W, F>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        glue_id: GlueId,
        limit: u32,
        shutdown: F,
    ) -> Result<(), CliError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let config = TailConfig::default()
            .with_follow(true)
            .with_limit(limit)
            .with_interval(self.poll_interval);
        let mut batches = LogTail::spawn(Arc::clone(&self.client), glue_id, config).debounce(self.debounce);
        futures::pin_mut!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    debug!("log follow interrupted");
                    break;
                }
                batch = batches.next() => match batch {
                    Some(Ok(entries)) => format.write(writer, &LogLines { entries })?,
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::commands::fake::FakeApi;
    use chrono::Utc;
    use glue_proto::{LogEntry, LogLevel, LogPage};

    fn page(messages: &[&str]) -> LogPage {
        LogPage {
            entries: messages
                .iter()
                .map(|m| LogEntry {
                    glue_id: GlueId::parse("g_1").expect("valid"),
                    execution_id: None,
                    level: LogLevel::Info,
                    message: (*m).to_string(),
                    timestamp: Utc::now(),
                })
                .collect(),
            cursor: Some("c".into()),
            has_more: false,
        }
    }

    fn command(api: FakeApi) -> LogsCommand<FakeApi> {
        LogsCommand::new(Arc::new(api), Duration::from_secs(1), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn prints_one_page() {
        let cmd = command(FakeApi::default().with_log_pages(vec![page(&["started", "done"])]));
        let args = LogsArgs {
            glue: "g_1".into(),
            follow: false,
            limit: 10,
        };

        let mut out = Vec::new();
        cmd.execute(&mut out, &OutputFormat::default(), &args)
            .await
            .expect("logs");

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("INFO  started"));
        assert!(text.contains("INFO  done"));
    }

    #[tokio::test]
    async fn empty_page_says_so() {
        let cmd = command(FakeApi::default());
        let args = LogsArgs {
            glue: "g_1".into(),
            follow: false,
            limit: 10,
        };

        let mut out = Vec::new();
        cmd.execute(&mut out, &OutputFormat::default(), &args)
            .await
            .expect("logs");
        assert!(String::from_utf8_lossy(&out).contains("No logs yet"));
    }

    #[tokio::test(start_paused = true)]
    async fn follow_writes_one_json_array_per_batch() {
        let cmd = command(FakeApi::default().with_log_pages(vec![
            page(&["a", "b"]),
            page(&[]),
            page(&["c"]),
        ]));

        let mut out = Vec::new();
        cmd.follow(
            &mut out,
            &OutputFormat::new(Format::Json),
            GlueId::parse("g_1").expect("valid"),
            10,
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await
        .expect("follow");

        let batches: Vec<Vec<LogEntry>> = serde_json::Deserializer::from_slice(&out)
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("json stream");
        let messages: Vec<Vec<String>> = batches
            .into_iter()
            .map(|b| b.into_iter().map(|e| e.message).collect())
            .collect();
        assert_eq!(messages, vec![vec!["a", "b"], vec!["c"]]);
    }
}
