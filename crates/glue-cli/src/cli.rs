//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// glue - manage, deploy and develop event-triggered glues.
#[derive(Parser, Debug, Clone)]
#[command(name = "glue")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Backend API URL (overrides the config file).
    #[arg(long, env = "GLUE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// API token (overrides stored credentials).
    #[arg(long, env = "GLUE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Path to the config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage stored credentials.
    Auth {
        /// Auth subcommand to execute.
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// List glues.
    List {
        /// Include archived glues.
        #[arg(short, long)]
        all: bool,
    },

    /// Show one glue.
    Get {
        /// Glue ID.
        glue: String,
    },

    /// Create a glue.
    Create {
        /// Name of the new glue.
        name: String,

        /// Optional description.
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Archive a glue.
    Archive {
        /// Glue ID.
        glue: String,
    },

    /// Add tags to a glue.
    Tag(TagArgs),

    /// Remove tags from a glue.
    Untag(TagArgs),

    /// Upload a script and follow the deployment.
    Deploy(DeployArgs),

    /// Inspect deployments.
    Deployments {
        /// Deployments subcommand to execute.
        #[command(subcommand)]
        command: DeploymentCommands,
    },

    /// Show execution logs.
    Logs(LogsArgs),

    /// Forward remote trigger events to a local runtime.
    Dev(DevArgs),
}

/// Auth subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommands {
    /// Verify and store an API token.
    Login {
        /// API token to store.
        #[arg(long = "with-token")]
        with_token: String,
    },

    /// Delete stored credentials.
    Logout,

    /// Show the authenticated account.
    Whoami,
}

/// Arguments for `tag` and `untag`.
#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Glue ID.
    pub glue: String,

    /// Tags to add or remove.
    #[arg(required = true)]
    pub tags: Vec<String>,
}

/// Arguments for `deploy`.
#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Script file to deploy.
    pub file: PathBuf,

    /// Glue to deploy to.
    #[arg(short, long)]
    pub glue: String,

    /// Return as soon as the upload is accepted.
    #[arg(long)]
    pub no_wait: bool,
}

/// Deployments subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum DeploymentCommands {
    /// List a glue's deployments.
    List {
        /// Glue ID.
        glue: String,
    },

    /// Follow a deployment until it finishes.
    Watch {
        /// Deployment ID.
        deployment: String,
    },
}

/// Arguments for `logs`.
#[derive(Args, Debug, Clone)]
pub struct LogsArgs {
    /// Glue ID.
    pub glue: String,

    /// Keep polling for new lines.
    #[arg(short = 'F', long)]
    pub follow: bool,

    /// Page size.
    #[arg(short = 'n', long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub limit: u32,
}

/// Arguments for `dev`.
#[derive(Args, Debug, Clone)]
pub struct DevArgs {
    /// Glue whose triggers to forward.
    #[arg(short, long)]
    pub glue: String,

    /// Local runtime URL events are POSTed to.
    #[arg(short, long, default_value = "http://localhost:3000")]
    pub target: String,

    /// Command that starts the local runtime.
    #[arg(short, long)]
    pub exec: Option<String>,
}
