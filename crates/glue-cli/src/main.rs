//! glue CLI binary entrypoint.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use glue_cli::cli::{AuthCommands, Cli, Commands};
use glue_cli::commands::{
    AuthCommand, DeployCommand, DeploymentsCommand, DevCommand, GlueCommand, LogsCommand, TagOp,
};
use glue_cli::config::{ConfigPaths, Settings};
use glue_cli::output::OutputFormat;
use glue_cli::{ApiClient, CliError};

fn main() -> ExitCode {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let format = OutputFormat::new(cli.format);
    let paths = match &cli.config {
        Some(path) => ConfigPaths::with_config_file(path.clone()),
        None => ConfigPaths::default_paths()?,
    };
    let settings = Settings::resolve(paths, cli.api_url.as_deref(), cli.token.as_deref())?;
    let client = ApiClient::from_settings(&settings)?;
    let config = &settings.config;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Auth { command } => {
            let client = match &command {
                AuthCommands::Login { with_token } => client.with_token(with_token.trim()),
                AuthCommands::Whoami => {
                    settings.require_token()?;
                    client
                }
                AuthCommands::Logout => client,
            };
            let cmd = AuthCommand::new(&client, &settings.paths.credentials);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::List { all } => {
            settings.require_token()?;
            GlueCommand::new(&client).list(&mut stdout, &format, all).await?;
        }
        Commands::Get { glue } => {
            settings.require_token()?;
            GlueCommand::new(&client).get(&mut stdout, &format, &glue).await?;
        }
        Commands::Create { name, description } => {
            settings.require_token()?;
            GlueCommand::new(&client)
                .create(&mut stdout, &format, &name, description.as_deref())
                .await?;
        }
        Commands::Archive { glue } => {
            settings.require_token()?;
            GlueCommand::new(&client).archive(&mut stdout, &format, &glue).await?;
        }
        Commands::Tag(args) => {
            settings.require_token()?;
            GlueCommand::new(&client)
                .tag(&mut stdout, &format, &args.glue, &args.tags, TagOp::Add)
                .await?;
        }
        Commands::Untag(args) => {
            settings.require_token()?;
            GlueCommand::new(&client)
                .tag(&mut stdout, &format, &args.glue, &args.tags, TagOp::Remove)
                .await?;
        }
        Commands::Deploy(args) => {
            settings.require_token()?;
            let cmd = DeployCommand::new(&client, config.watch_interval());
            cmd.execute(&mut stdout, &format, &args).await?;
        }
        Commands::Deployments { command } => {
            settings.require_token()?;
            let cmd = DeploymentsCommand::new(&client, config.watch_interval());
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Logs(args) => {
            settings.require_token()?;
            let cmd = LogsCommand::new(
                Arc::new(client),
                config.log_poll_interval(),
                config.log_debounce(),
            );
            cmd.execute(&mut stdout, &format, &args).await?;
        }
        Commands::Dev(args) => {
            settings.require_token()?;
            let cmd = DevCommand::new(&client);
            cmd.execute(&mut stdout, &format, &args).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glue_cli::cli::Format;
    use std::io::Write;
    use tempfile::TempDir;

    fn cli_in(dir: &TempDir, args: &[&str]) -> Cli {
        let config = dir.path().join("config.json");
        let mut argv = vec!["glue", "--config", config.to_str().expect("utf8 path")];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["glue", "--format", "json", "list"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[tokio::test]
    async fn commands_require_login() {
        let dir = TempDir::new().expect("tempdir");
        let cli = cli_in(&dir, &["--token", "", "list"]);
        let err = run(cli).await.expect_err("not logged in");
        assert!(matches!(err, CliError::Auth(_)));
    }

    #[tokio::test]
    async fn logout_without_credentials_succeeds() {
        let dir = TempDir::new().expect("tempdir");
        let cli = cli_in(&dir, &["auth", "logout"]);
        run(cli).await.expect("logout");
    }

    #[tokio::test]
    async fn invalid_config_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let mut file = std::fs::File::create(dir.path().join("config.json")).expect("create");
        file.write_all(br#"{"api_url": "ftp://nope"}"#).expect("write");

        let err = run(cli_in(&dir, &["auth", "logout"])).await.expect_err("bad config");
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_fails() {
        let dir = TempDir::new().expect("tempdir");
        let cli = cli_in(
            &dir,
            &["--api-url", "http://127.0.0.1:9", "--token", "t", "list"],
        );
        let err = run(cli).await.expect_err("no backend");
        assert!(matches!(err, CliError::Connection(_) | CliError::Timeout(_)));
    }
}
