//! Account sign-up and profile.

use clap::Subcommand;

use maison_storefront::error::AppError;
use maison_storefront::models::{Profile, ProfileUpdate};
use maison_storefront::services::SignUp;
use maison_storefront::state::AppState;

use super::Credentials;

#[derive(Debug, Subcommand)]
pub enum AccountAction {
    /// Create an account
    Signup {
        #[arg(long, env = "MAISON_EMAIL")]
        email: String,
        #[arg(long, env = "MAISON_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        username: String,
    },
    /// Show the profile
    Profile {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Change username and/or full name
    UpdateProfile {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        full_name: Option<String>,
    },
}

pub async fn run(state: &AppState, action: AccountAction) -> Result<(), AppError> {
    match action {
        AccountAction::Signup {
            email,
            password,
            full_name,
            username,
        } => {
            let session = state
                .auth()
                .sign_up(&SignUp {
                    email,
                    password,
                    full_name,
                    username,
                })
                .await?;
            println!("Welcome! Signed up as {}", session.email);
            state.auth().sign_out(session);
        }
        AccountAction::Profile { credentials } => {
            let session = credentials.require(state).await?;
            print_profile(&state.profiles().get(&session).await?);
            state.auth().sign_out(session);
        }
        AccountAction::UpdateProfile {
            credentials,
            username,
            full_name,
        } => {
            let session = credentials.require(state).await?;
            let update = ProfileUpdate {
                username,
                full_name,
            };
            if update.is_empty() {
                return Err(AppError::BadRequest(
                    "nothing to update: pass --username or --full-name".to_string(),
                ));
            }
            let profile = state.profiles().update(&session, &update).await?;
            println!("Profile updated");
            print_profile(&profile);
            state.auth().sign_out(session);
        }
    }
    Ok(())
}

fn print_profile(profile: &Profile) {
    println!("Username:  {}", profile.username);
    println!("Full name: {}", profile.full_name);
    if let Some(phone) = &profile.phone_number {
        println!("Phone:     {phone}");
    }
    println!("Member since {}", profile.created_at.format("%B %Y"));
}
