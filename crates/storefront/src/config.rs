//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `MAISON_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either, orders and accounts live in memory)
//! - `MAISON_DATA_DIR` - Directory for the persisted cart (default: .maison)
//! - `MAISON_TAX_RATE` - Tax as a fraction of the subtotal (default: 0.08)
//! - `MAISON_FREE_SHIPPING_THRESHOLD` - Subtotal above which shipping is free (default: 200)
//! - `MAISON_FLAT_SHIPPING` - Shipping charged otherwise (default: 20)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: development)

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use maison_core::Money;

use crate::checkout::PricingPolicy;

const DEFAULT_DATA_DIR: &str = ".maison";
const DEFAULT_SENTRY_ENVIRONMENT: &str = "development";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Directory holding the persisted cart
    pub data_dir: PathBuf,
    /// Shipping and tax rules applied at checkout
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("MAISON_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .filter(|url| !url.trim().is_empty())
            .map(SecretString::from);

        let data_dir = lookup("MAISON_DATA_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            tax_rate: parse_rate(&lookup, "MAISON_TAX_RATE")?.unwrap_or(defaults.tax_rate),
            free_shipping_threshold: parse_amount(&lookup, "MAISON_FREE_SHIPPING_THRESHOLD")?
                .unwrap_or(defaults.free_shipping_threshold),
            flat_shipping: parse_amount(&lookup, "MAISON_FLAT_SHIPPING")?
                .unwrap_or(defaults.flat_shipping),
        };

        Ok(Self {
            database_url,
            data_dir,
            pricing,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT")
                .unwrap_or_else(|| DEFAULT_SENTRY_ENVIRONMENT.to_string()),
        })
    }

    /// Database URL, for commands that cannot run without one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no database is configured.
    pub fn require_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("MAISON_DATABASE_URL".to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional decimal variable.
fn parse_decimal(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Decimal>, ConfigError> {
    lookup(key)
        .map(|value| {
            Decimal::from_str(value.trim())
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse a fraction between 0 and 1.
fn parse_rate(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Decimal>, ConfigError> {
    let rate = parse_decimal(lookup, key)?;
    if let Some(rate) = rate
        && (rate.is_sign_negative() || rate > Decimal::ONE)
    {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be a fraction between 0 and 1 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Parse a non-negative money amount.
fn parse_amount(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Money>, ConfigError> {
    let amount = parse_decimal(lookup, key)?;
    if let Some(amount) = amount
        && amount.is_sign_negative()
    {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must not be negative (got {amount})"),
        ));
    }
    Ok(amount.map(Money::new))
}
