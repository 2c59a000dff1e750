//! askbox CLI entry point.

use anyhow::Result;
use askbox::cli::{commands, Cli, Commands};
use askbox::config::Settings;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut settings = Settings::load_from(config_path.as_ref())?;

    if settings.general.load_dotenv {
        // A missing .env is fine; the key may come from the environment
        dotenvy::dotenv().ok();
    }

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("askbox={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Execute command
    match &cli.command {
        Commands::Chat { agent, no_speech } => {
            if *no_speech {
                settings.speech.enabled = false;
            }
            commands::run_chat(*agent, settings).await?;
        }

        Commands::Ask {
            question,
            agent,
            no_speech,
        } => {
            if *no_speech {
                settings.speech.enabled = false;
            }
            commands::run_ask(question, *agent, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
