pub mod commands;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::client::ApiClient;
use crate::session::FileSessionStore;

#[derive(Parser)]
#[command(name = "vox")]
#[command(about = "Vox CLI - admin and billing console for the voice-agents platform")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Tenant administration (superadmin)")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },

    #[command(about = "Wallet, usage and transaction dashboards")]
    Billing {
        #[command(subcommand)]
        cmd: commands::billing::BillingCommands,
    },
}

#[derive(Debug, Clone, Copy)]
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

    let store = Arc::new(FileSessionStore::from_config()?);
    let client = ApiClient::from_config(store)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &client, output_format).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd, &client, output_format).await,
        Commands::Billing { cmd } => commands::billing::handle(cmd, &client, output_format).await,
    }
}
