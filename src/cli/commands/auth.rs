use clap::Subcommand;
use serde_json::json;

use crate::api::auth;
use crate::cli::utils::{output_error, output_success, prompt_if_missing};
use crate::cli::OutputFormat;
use crate::client::ApiClient;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Log in with email and password")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Complete signup from an invitation token")]
    Signup {
        #[arg(help = "Invitation token from the email link")]
        token: String,
        #[arg(long, help = "Password for the new account (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Request a password reset email")]
    ForgotPassword {
        #[arg(help = "Account email")]
        email: String,
    },

    #[command(about = "Set a new password using a reset token")]
    ResetPassword {
        #[arg(help = "Reset token from the email link")]
        token: String,
        #[arg(long, help = "New password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Log out and discard the stored session")]
    Logout,

    #[command(about = "Force a token refresh")]
    Refresh,

    #[command(about = "Show the current session's identity and role")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = prompt_if_missing(password, "Password")?;
            auth::login(client, &email, &password).await?;

            let identity = auth::current_claims(client)
                .map(|claims| json!({ "email": claims.email, "role": claims.role.as_str() }));
            output_success(output_format, &format!("Logged in as {}", email), identity)
        }
        AuthCommands::Signup { token, password } => {
            let password = prompt_if_missing(password, "Choose a password")?;
            auth::accept_invitation(client, &token, &password).await?;
            output_success(output_format, "Account created, you are now logged in", None)
        }
        AuthCommands::ForgotPassword { email } => {
            auth::request_password_reset(client, &email).await?;
            output_success(output_format, &format!("Password reset email sent to {}", email), None)
        }
        AuthCommands::ResetPassword { token, password } => {
            let password = prompt_if_missing(password, "New password")?;
            auth::reset_password(client, &token, &password).await?;
            output_success(output_format, "Password updated, please log in again", None)
        }
        AuthCommands::Logout => {
            auth::logout(client).await?;
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Refresh => {
            auth::refresh(client).await?;
            output_success(output_format, "Session refreshed", None)
        }
        AuthCommands::Whoami => match auth::current_claims(client) {
            Some(claims) => output_success(
                output_format,
                &format!("{} ({})", claims.email, claims.role.as_str()),
                Some(json!({
                    "sub": claims.sub,
                    "email": claims.email,
                    "role": claims.role.as_str(),
                    "client_id": claims.client_id,
                })),
            ),
            None => output_error(output_format, "Not logged in", Some("NO_SESSION")),
        },
    }
}
