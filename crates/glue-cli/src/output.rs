//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use glue_proto::{Deployment, DeploymentSnapshot, Glue, LogEntry, StepStatus, User};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay + ?Sized,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay + ?Sized,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl TableDisplay for User {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match &self.name {
            Some(name) => writeln!(writer, "Logged in as {name} <{}>", self.email)?,
            None => writeln!(writer, "Logged in as {}", self.email)?,
        }
        writeln!(writer, "Account ID:  {}", self.id)?;
        Ok(())
    }
}

/// List of glues for display.
#[derive(Debug, Clone, Serialize)]
pub struct GlueList {
    /// Glues to show.
    pub glues: Vec<Glue>,
}

impl TableDisplay for GlueList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.glues.is_empty() {
            writeln!(writer, "No glues found")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<26}  {:<24}  {:<9}  {:<20}  TAGS",
            "ID", "NAME", "STATE", "CREATED"
        )?;
        writeln!(writer, "{}", "─".repeat(96))?;

        for glue in &self.glues {
            writeln!(
                writer,
                "{:<26}  {:<24}  {:<9}  {:<20}  {}",
                truncate(glue.id.as_str(), 26),
                truncate(&glue.name, 24),
                if glue.archived { "archived" } else { "active" },
                glue.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                glue.tags.join(",")
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} glue(s)", self.glues.len())?;
        Ok(())
    }
}

impl TableDisplay for Glue {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Glue: {}", self.name)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "ID:           {}", self.id)?;
        if let Some(description) = &self.description {
            writeln!(writer, "Description:  {description}")?;
        }
        writeln!(
            writer,
            "State:        {}",
            if self.archived { "archived" } else { "active" }
        )?;
        if self.tags.is_empty() {
            writeln!(writer, "Tags:         -")?;
        } else {
            writeln!(writer, "Tags:         {}", self.tags.join(", "))?;
        }
        match &self.current_deployment_id {
            Some(id) => writeln!(writer, "Deployment:   {id}")?,
            None => writeln!(writer, "Deployment:   (none)")?,
        }
        writeln!(
            writer,
            "Created:      {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        if let Some(updated) = self.updated_at {
            writeln!(writer, "Updated:      {}", updated.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

/// List of deployments for display.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentList {
    /// Deployments to show.
    pub deployments: Vec<Deployment>,
}

impl TableDisplay for DeploymentList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.deployments.is_empty() {
            writeln!(writer, "No deployments")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<26}  {:<10}  {:<20}  FINISHED",
            "ID", "STATUS", "CREATED"
        )?;
        writeln!(writer, "{}", "─".repeat(80))?;

        for d in &self.deployments {
            let finished = d
                .finished_at
                .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
            writeln!(
                writer,
                "{:<26}  {:<10}  {:<20}  {finished}",
                truncate(d.id.as_str(), 26),
                d.status.to_string(),
                d.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Total: {} deployment(s)", self.deployments.len())?;
        Ok(())
    }
}

impl TableDisplay for Deployment {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Deployment {} ({})", self.id, self.status)?;
        Ok(())
    }
}

impl TableDisplay for DeploymentSnapshot {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "Deployment {}: {}",
            self.deployment.id,
            self.status()
        )?;
        for step in &self.steps {
            writeln!(
                writer,
                "  {} {:<28} {}",
                step_marker(step.status),
                truncate(&step.title, 28),
                step.status
            )?;
            if matches!(step.status, StepStatus::Failure) {
                if let Some(text) = &step.text {
                    for line in text.lines() {
                        writeln!(writer, "      {line}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn step_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "·",
        StepStatus::Running => "…",
        StepStatus::Success => "✓",
        StepStatus::Failure => "✗",
        StepStatus::Skipped => "-",
    }
}

/// A batch of log lines.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LogLines {
    /// Entries in arrival order.
    pub entries: Vec<LogEntry>,
}

impl TableDisplay for LogLines {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for entry in &self.entries {
            writeln!(
                writer,
                "{} {:<5} {}",
                entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                entry.level.to_string(),
                entry.message
            )?;
        }
        Ok(())
    }
}

/// Simple message output.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
    /// Whether this is a success message.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Create an informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.success {
            writeln!(writer, "✓ {}", self.message)?;
        } else {
            writeln!(writer, "{}", self.message)?;
        }
        Ok(())
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
