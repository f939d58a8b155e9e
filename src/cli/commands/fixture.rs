use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::OutputFormat;
use crate::cli::utils::output_success;
use crate::config::{config, StoreBackend};
use crate::database::{fixtures, open_store};
use crate::services::TimeService;

#[derive(Subcommand)]
pub enum FixtureCommands {
    #[command(about = "Load a YAML fixtures file into the configured store")]
    Load {
        #[arg(help = "Fixtures file (users, locations, routes)")]
        file: PathBuf,
    },
}

pub async fn handle(cmd: FixtureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FixtureCommands::Load { file } => handle_load(file, output_format).await,
    }
}

async fn handle_load(file: PathBuf, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    if config.store.backend == StoreBackend::Memory {
        tracing::warn!("STORE_BACKEND is memory, loaded records vanish when this command exits");
    }

    let time = TimeService::new(&config.schedule.timezone)
        .with_context(|| format!("invalid TIMEZONE {}", config.schedule.timezone))?;
    let store = open_store(&config.store).await.context("failed to open record store")?;
    let summary = fixtures::load(store.as_ref(), &config.store, &time, &file).await?;

    output_success(
        &output_format,
        &format!(
            "Loaded {} users, {} locations and {} routes from {}",
            summary.users,
            summary.locations,
            summary.routes,
            file.display()
        ),
        Some(json!({ "loaded": summary })),
    )
}
