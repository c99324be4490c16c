use clap::Subcommand;
use serde_json::json;

use crate::api::{admin, auth};
use crate::claims::Role;
use crate::cli::utils::output_data;
use crate::cli::OutputFormat;
use crate::client::ApiClient;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "List client accounts")]
    List {
        #[arg(long, help = "Only show active clients")]
        active_only: bool,
    },

    #[command(about = "Show one client account")]
    Show {
        #[arg(help = "Client id")]
        id: String,
    },

    #[command(about = "Create a client account")]
    Create {
        #[arg(help = "Client name")]
        name: String,
        #[arg(long, help = "Billing contact email")]
        contact_email: Option<String>,
    },

    #[command(about = "Update a client account")]
    Update {
        #[arg(help = "Client id")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        contact_email: Option<String>,
        #[arg(long, help = "Activate (true) or suspend (false) the client")]
        active: Option<bool>,
    },

    #[command(about = "Delete a client account")]
    Delete {
        #[arg(help = "Client id")]
        id: String,
    },

    #[command(about = "Invite a user into a client account")]
    Invite {
        #[arg(help = "Client id")]
        client_id: String,
        #[arg(help = "Invitee email")]
        email: String,
        #[arg(long, default_value = "viewer", help = "Role: admin or viewer")]
        role: String,
    },
}

pub async fn handle(cmd: AdminCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    // UI gating only; the backend enforces the real authorization check
    let role = auth::current_claims(client).map(|c| c.role).unwrap_or(Role::Unknown);
    if !role.can_manage_clients() {
        anyhow::bail!("admin commands require a superadmin session (current role: {})", role.as_str());
    }

    match cmd {
        AdminCommands::List { active_only } => {
            let page = admin::list_clients(client, active_only).await?;
            output_data(
                output_format,
                &json!({
                    "clients": page.items,
                    "pagination": page.pagination,
                }),
            )
        }
        AdminCommands::Show { id } => {
            let account = admin::get_client(client, &id).await?;
            output_data(output_format, &serde_json::to_value(account)?)
        }
        AdminCommands::Create { name, contact_email } => {
            let account = admin::create_client(client, &name, contact_email.as_deref()).await?;
            output_data(output_format, &serde_json::to_value(account)?)
        }
        AdminCommands::Update { id, name, contact_email, active } => {
            let update = admin::ClientUpdate { name, contact_email, active };
            let account = admin::update_client(client, &id, &update).await?;
            output_data(output_format, &serde_json::to_value(account)?)
        }
        AdminCommands::Delete { id } => {
            admin::delete_client(client, &id).await?;
            output_data(output_format, &json!({ "deleted": id }))
        }
        AdminCommands::Invite { client_id, email, role } => {
            let role = match role.as_str() {
                "admin" => Role::Admin,
                "viewer" => Role::Viewer,
                other => anyhow::bail!("invalid role '{}', expected admin or viewer", other),
            };
            let invitation = admin::invite_user(client, &client_id, &email, role).await?;
            output_data(output_format, &serde_json::to_value(invitation)?)
        }
    }
}
