//! Order and account persistence.
//!
//! # Database: `maison`
//!
//! ## Tables (schema `storefront`)
//!
//! - `users` - Accounts
//! - `user_passwords` - Argon2 password hashes
//! - `profiles` - Username and display name per account
//! - `orders` - One row per order, unique `order_number`
//! - `shipping_addresses` - Shipping address and lookup email per order
//! - `order_items` - Line items with name and price at purchase time
//!
//! # Backends
//!
//! [`OrderRepository`] and [`UserRepository`] are implemented for
//! `PostgreSQL` ([`PgOrderRepository`], [`PgUserRepository`]) and in memory
//! ([`MemoryRepository`]) for local runs without a database and for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p maison-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use maison_core::{Email, OrderId, OrderNumber, OrderStatus, UserId};

use crate::models::{NewProfile, Profile, ProfileUpdate, User};
use crate::orders::{NewOrder, Order};

pub use memory::MemoryRepository;
pub use orders::PgOrderRepository;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Order storage.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Write an order with its shipping address and line items atomically.
    ///
    /// Returns [`RepositoryError::Conflict`] if `number` is already taken.
    async fn create(&self, number: &OrderNumber, order: &NewOrder) -> Result<Order, RepositoryError>;

    /// Find an order by number, regardless of owner.
    async fn get_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, RepositoryError>;

    /// Find an order whose number and shipping email both match.
    async fn find_by_number_and_email(
        &self,
        number: &OrderNumber,
        email: &Email,
    ) -> Result<Option<Order>, RepositoryError>;

    /// All orders owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Move an order from `from` to `to`.
    ///
    /// Returns [`RepositoryError::Conflict`] if the stored status is no
    /// longer `from`, and [`RepositoryError::NotFound`] for an unknown id.
    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), RepositoryError>;
}

/// Account storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user, their password hash and profile atomically.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email or username exists.
    async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        profile: &NewProfile,
    ) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// A user and their password hash, if the user exists and has one.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError>;

    /// Apply `update` and stamp `updated_at`.
    ///
    /// Returns [`RepositoryError::NotFound`] if the profile does not exist
    /// and [`RepositoryError::Conflict`] if the username is taken.
    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
