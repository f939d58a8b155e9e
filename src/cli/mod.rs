pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "reciapp")]
#[command(about = "Reciapp CLI - operate picking routes through the Reciapp API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "RECIAPP_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the Reciapp API"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Route assignment, start and stop completion")]
    Routes {
        #[command(subcommand)]
        cmd: commands::routes::RouteCommands,
    },

    #[command(about = "Open shifts and stop pinning")]
    Shifts {
        #[command(subcommand)]
        cmd: commands::shifts::ShiftCommands,
    },

    #[command(about = "Check API and store health")]
    Health,

    #[command(about = "Seed the configured store from fixture files")]
    Fixture {
        #[command(subcommand)]
        cmd: commands::fixture::FixtureCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(&cli.server)?;

    match cli.command {
        Commands::Routes { cmd } => commands::routes::handle(cmd, &client, output_format).await,
        Commands::Shifts { cmd } => commands::shifts::handle(cmd, &client, output_format).await,
        Commands::Health => commands::health::handle(&client, output_format).await,
        Commands::Fixture { cmd } => commands::fixture::handle(cmd, output_format).await,
    }
}
