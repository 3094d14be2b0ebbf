//! Credential management.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::cli::AuthCommands;
use crate::client::GlueApi;
use crate::config::Credentials;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Auth command executor.
pub struct AuthCommand<'a, C> {
    client: &'a C,
    credentials_path: &'a Path,
}

impl<'a, C: GlueApi> AuthCommand<'a, C> {
    /// Create a new auth command.
    ///
    /// For `login`, `client` must already carry the token being stored.
    #[must_use]
    pub const fn new(client: &'a C, credentials_path: &'a Path) -> Self {
        Self {
            client,
            credentials_path,
        }
    }

    /// Execute an auth subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the token or the credentials
    /// file cannot be written.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &AuthCommands,
    ) -> Result<(), CliError> {
        match command {
            AuthCommands::Login { with_token } => {
                let token = with_token.trim();
                if token.is_empty() {
                    return Err(CliError::InvalidArgument("token cannot be empty".into()));
                }

                let user = self.client.me().await?;
                Credentials {
                    token: token.to_string(),
                    user_email: Some(user.email.clone()),
                }
                .save(self.credentials_path)?;
                debug!(email = %user.email, "login verified");

                format.write(writer, &Message::success(format!("Logged in as {}", user.email)))?;
            }
            AuthCommands::Logout => {
                let msg = if Credentials::delete(self.credentials_path)? {
                    Message::success("Logged out")
                } else {
                    Message::info("Not logged in")
                };
                format.write(writer, &msg)?;
            }
            AuthCommands::Whoami => {
                let user = self.client.me().await?;
                format.write(writer, &user)?;
            }
        }
        Ok(())
    }
}
