//! Lumifi CLI - practice administration from the terminal

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "lumifi")]
#[command(about = "Manage a Lumifi dental practice account")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Data directory for the session, cached caller IP and logs
    #[arg(short = 'd', long, global = true, env = "LUMIFI_STATE_DIR")]
    data_dir: Option<PathBuf>,

    /// Request timeout in seconds (0 = no timeout), overrides the config file
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    /// Configuration file (toml or yaml)
    #[arg(short = 'c', long, global = true, env = "LUMIFI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config::load(cli.config.as_deref(), cli.data_dir, cli.timeout)?;
    logging::init_logging(cli.log_level.into(), &settings.data_dir, cli.no_file_log)?;

    info!(base_url = %settings.api.base_url, "Starting Lumifi CLI");

    match cli.command.execute(settings).await {
        Ok(()) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_user_create_needs_exactly_one_role_source() {
        let base = [
            "lumifi", "users", "create", "--first-name", "Grace", "--last-name", "Smith",
            "--email", "grace@practice.com",
        ];
        let with = |extra: &[&'static str]| {
            Cli::try_parse_from(base.iter().chain(extra.iter()).copied())
        };

        assert!(with(&[]).is_err());
        assert!(with(&["--doctor"]).is_ok());
        assert!(with(&["--role", "Staff"]).is_ok());
        assert!(with(&["--doctor", "--role", "Staff"]).is_err());
    }

    #[test]
    fn test_practice_update_fields_are_optional() {
        assert!(Cli::try_parse_from(["lumifi", "practice", "update", "--city", "Austin"]).is_ok());
    }
}
