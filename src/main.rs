//! Summarist CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use summarist::cli::{commands, Cli, Commands, ConfigAction};
use summarist::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("summarist={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);

    // Commands that must work without a loadable config
    match &cli.command {
        Commands::Config { action: action @ ConfigAction::Path } => {
            return commands::run_config(action, &config_path);
        }
        Commands::Doctor => {
            return match Settings::load_from(Some(&config_path)) {
                Ok(settings) => commands::run_doctor(&config_path, Some(&settings), None),
                Err(e) => commands::run_doctor(&config_path, None, Some(e.to_string())),
            };
        }
        _ => {}
    }

    // A missing or invalid config stops the run before any item is attempted
    let settings = Settings::load_from(Some(&config_path))?;

    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Batch { all } => {
            commands::run_batch(*all, settings).await?;
        }

        Commands::Url { urls } => {
            commands::run_url(urls, settings).await?;
        }

        Commands::Sources => {
            commands::run_sources(&settings)?;
        }

        Commands::History { source } => {
            commands::run_history(*source, &settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &config_path)?;
        }

        Commands::Doctor => unreachable!("handled before config load"),
    }

    Ok(())
}
