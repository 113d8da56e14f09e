//! `maison` subcommands.
//!
//! Commands write their results to stdout; logs go to stderr.

#![allow(clippy::print_stdout)]

use clap::Args;

use maison_storefront::error::AppError;
use maison_storefront::models::AuthSession;
use maison_storefront::state::AppState;

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

/// Sign-in flags shared by commands that act for a customer.
#[derive(Debug, Args)]
pub struct Credentials {
    /// Account email
    #[arg(long, env = "MAISON_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "MAISON_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl Credentials {
    /// Sign in if credentials were given.
    pub async fn sign_in(&self, state: &AppState) -> Result<Option<AuthSession>, AppError> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(Some(state.auth().sign_in(email, password).await?)),
            (None, None) => Ok(None),
            _ => Err(AppError::BadRequest(
                "both --email and --password are required to sign in".to_string(),
            )),
        }
    }

    /// Sign in, failing when no credentials were given.
    pub async fn require(&self, state: &AppState) -> Result<AuthSession, AppError> {
        self.sign_in(state).await?.ok_or_else(|| {
            AppError::Unauthorized("sign in with --email and --password".to_string())
        })
    }
}
