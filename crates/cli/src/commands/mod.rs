//! `maison-admin` subcommands.

use maison_core::{OrderNumberError, ParseEnumError};
use maison_storefront::config::ConfigError;
use maison_storefront::orders::OrderError;
use thiserror::Error;

pub mod migrate;
pub mod orders;

/// Errors from admin commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),

    #[error("{0}")]
    InvalidStatus(#[from] ParseEnumError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Connect to the storefront database named by the environment.
async fn connect() -> Result<sqlx::PgPool, CommandError> {
    let config = maison_storefront::config::StorefrontConfig::from_env()?;
    let url = config.require_database_url()?;

    tracing::info!("Connecting to storefront database...");
    Ok(maison_storefront::db::create_pool(url).await?)
}
