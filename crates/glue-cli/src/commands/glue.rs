//! Glue management: list, get, create, archive and tagging.

use std::io::Write;

use glue_proto::{normalize_tags, CreateGlue, GlueId};

use crate::client::GlueApi;
use crate::error::CliError;
use crate::output::{GlueList, Message, OutputFormat};

/// Whether a tag command adds or removes tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOp {
    /// Merge the given tags into the glue's tags.
    Add,
    /// Remove the given tags from the glue's tags.
    Remove,
}

/// Glue command executor.
pub struct GlueCommand<'a, C> {
    client: &'a C,
}

impl<'a, C: GlueApi> GlueCommand<'a, C> {
    /// Create a new glue command.
    #[must_use]
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// List glues; archived ones only with `all`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        all: bool,
    ) -> Result<(), CliError> {
        let mut glues = self.client.list_glues(all).await?;
        if !all {
            glues.retain(|g| !g.archived);
        }
        glues.sort_by(|a, b| a.name.cmp(&b.name));
        format.write(writer, &GlueList { glues })
    }

    /// Show one glue.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is invalid or the glue does not exist.
    pub async fn get<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        id: &str,
    ) -> Result<(), CliError> {
        let glue = self.client.get_glue(&GlueId::parse(id)?).await?;
        format.write(writer, &glue)
    }

    /// Create a glue.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the request fails.
    pub async fn create<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), CliError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CliError::InvalidArgument("glue name cannot be empty".into()));
        }

        let body = CreateGlue {
            name: name.to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        };
        let glue = self.client.create_glue(&body).await?;

        if format.is_json() {
            format.write(writer, &glue)
        } else {
            format.write(
                writer,
                &Message::success(format!("Created glue {} ({})", glue.name, glue.id)),
            )
        }
    }

    /// Archive a glue.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is invalid or the request fails.
    pub async fn archive<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        id: &str,
    ) -> Result<(), CliError> {
        let glue = self.client.archive_glue(&GlueId::parse(id)?).await?;
        if format.is_json() {
            format.write(writer, &glue)
        } else {
            format.write(writer, &Message::success(format!("Archived glue {}", glue.name)))
        }
    }

    /// Add or remove tags.
    ///
    /// Tags are normalized first; the merged set is written back with a
    /// single update.
    ///
    /// # Errors
    ///
    /// Returns an error if a tag is invalid or a request fails.
    pub async fn tag<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        id: &str,
        tags: &[String],
        op: TagOp,
    ) -> Result<(), CliError> {
        let id = GlueId::parse(id)?;
        let requested = normalize_tags(tags)?;
        let current = self.client.get_glue(&id).await?;

        let updated = match op {
            TagOp::Add => normalize_tags(current.tags.iter().chain(&requested))?,
            TagOp::Remove => current
                .tags
                .into_iter()
                .filter(|t| !requested.contains(t))
                .collect(),
        };

        let glue = self.client.set_tags(&id, &updated).await?;
        if format.is_json() {
            format.write(writer, &glue)
        } else if glue.tags.is_empty() {
            format.write(writer, &Message::success(format!("{} has no tags", glue.name)))
        } else {
            format.write(
                writer,
                &Message::success(format!("{} tags: {}", glue.name, glue.tags.join(", "))),
            )
        }
    }
}
