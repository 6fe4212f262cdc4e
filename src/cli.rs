// src/cli.rs
use crate::core::{
    remote_store, AppliedJobsService, ConfigManager, ConfigService, FileConfigStore, Materializer,
    UserConfigStore,
};
use crate::types::BotConfig;
use crate::web::start_web_server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "applier-console")]
#[command(about = "Web console for configuring and running the LinkedIn auto-applier")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Overrides ROCKET_PORT
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Write the stored configuration (or a JSON file) into the bot's modules
    Materialize {
        /// JSON configuration to write instead of the stored one
        #[arg(long)]
        from: Option<PathBuf>,
        /// Use this user's stored configuration
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Print the values currently in the bot's modules as JSON
    ReadReference,
    /// Print the stored configuration as JSON
    ShowConfig {
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Copy the local applied-jobs history into a user's remote table
    SyncJobs {
        #[arg(long)]
        user_id: String,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = ConfigManager::load()?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => start_web_server(config, port).await,

        Command::Materialize { from, user_id } => {
            let configs = config_service(&config).await?;
            let bot_config = match from {
                Some(path) => read_config_file(&path).await?,
                None => configs.load(user_id.as_deref()).await,
            };
            let written = configs.materializer().write(&bot_config).await?;
            for path in written {
                info!("Wrote {}", path.display());
            }
            Ok(())
        }

        Command::ReadReference => {
            let materializer = materializer(&config);
            if !materializer.reference_available() {
                anyhow::bail!(
                    "Reference directory not found: {}",
                    materializer.reference_dir().display()
                );
            }
            print_json(&materializer.read().await)
        }

        Command::ShowConfig { user_id } => {
            let configs = config_service(&config).await?;
            print_json(&configs.load(user_id.as_deref()).await)
        }

        Command::SyncJobs { user_id } => {
            let remote = remote_store::connect(&config.remote_store).await?;
            let jobs = AppliedJobsService::new(config.applied_history_csv(), remote);

            match jobs.sync(Some(&user_id)).await {
                Ok(outcome) => {
                    match outcome.message {
                        Some(message) => info!("{}", message),
                        None => info!("Synced {} applied jobs for {}", outcome.synced, user_id),
                    }
                    Ok(())
                }
                Err(e) => {
                    error!("Sync failed: {}", e);
                    Err(anyhow::anyhow!("Sync failed: {}", e))
                }
            }
        }
    }
}

fn materializer(config: &ConfigManager) -> Materializer {
    Materializer::new(
        config.environment.reference_path.clone(),
        config.bot.interpreter.clone(),
    )
}

async fn config_service(config: &ConfigManager) -> Result<ConfigService> {
    let materializer = materializer(config);
    let remote = remote_store::connect(&config.remote_store).await?;
    let file_store = FileConfigStore::new(
        config.environment.config_json_path.clone(),
        materializer.clone(),
        config.restricted,
    );
    Ok(ConfigService::new(
        file_store,
        UserConfigStore::new(remote),
        materializer,
    ))
}

async fn read_config_file(path: &Path) -> Result<BotConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json(config: &BotConfig) -> Result<()> {
    let rendered = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", rendered);
    Ok(())
}
