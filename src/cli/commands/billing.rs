use clap::Subcommand;
use serde_json::json;

use crate::api::{auth, billing};
use crate::claims::Role;
use crate::cli::utils::output_data;
use crate::cli::OutputFormat;
use crate::client::ApiClient;

#[derive(Subcommand)]
pub enum BillingCommands {
    #[command(about = "Show the wallet balance and recharge settings")]
    Wallet,

    #[command(about = "List per-agent usage for the current period")]
    Usage {
        #[arg(long, default_value_t = 25)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    #[command(about = "List wallet transactions")]
    Transactions {
        #[arg(long, default_value_t = 25)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

pub async fn handle(cmd: BillingCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let role = auth::current_claims(client).map(|c| c.role).unwrap_or(Role::Unknown);
    if !role.can_view_billing() {
        anyhow::bail!("billing commands require a logged-in session");
    }

    match cmd {
        BillingCommands::Wallet => {
            let wallet = billing::wallet_summary(client).await?;
            output_data(output_format, &serde_json::to_value(wallet)?)
        }
        BillingCommands::Usage { limit, offset } => {
            let page = billing::usage(client, limit, offset).await?;
            output_data(
                output_format,
                &json!({
                    "usage": page.items,
                    "pagination": page.pagination,
                }),
            )
        }
        BillingCommands::Transactions { limit, offset } => {
            let page = billing::transactions(client, limit, offset).await?;
            output_data(
                output_format,
                &json!({
                    "transactions": page.items,
                    "pagination": page.pagination,
                }),
            )
        }
    }
}
