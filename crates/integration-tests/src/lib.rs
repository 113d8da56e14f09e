//! Integration tests for Maison.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios
//! cargo test -p maison-integration-tests
//!
//! # PostgreSQL scenarios (migrations are applied automatically)
//! MAISON_TEST_DATABASE_URL=postgres://localhost/maison_test \
//!     cargo test -p maison-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart to order, end to end
//! - `accounts` - Sign-up, member checkout, order history and profiles
//! - `postgres` - The same scenarios against a real database

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use secrecy::SecretString;
use tempfile::TempDir;

use maison_core::{Money, Product, ProductId};
use maison_storefront::catalog::Catalog;
use maison_storefront::checkout::AddressForm;
use maison_storefront::config::StorefrontConfig;
use maison_storefront::db::{self, MemoryRepository, PgOrderRepository, PgUserRepository};
use maison_storefront::state::{AppState, Backend};

/// A storefront over a throwaway data directory.
pub struct TestContext {
    /// Holds the cart directory alive for the test's duration.
    pub dir: TempDir,
    pub state: AppState,
}

impl TestContext {
    /// Storefront with the built-in catalog and in-memory repositories.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn memory() -> Self {
        Self::memory_with_catalog(builtin_catalog())
    }

    /// Storefront with `catalog` and in-memory repositories.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn memory_with_catalog(catalog: Catalog) -> Self {
        let dir = temp_dir();
        let repo = Arc::new(MemoryRepository::new());
        let state = AppState::build(config_for(&dir), Backend::Memory, catalog, repo.clone(), repo);
        Self { dir, state }
    }

    /// Storefront against the database named by `MAISON_TEST_DATABASE_URL`,
    /// with migrations applied.
    ///
    /// # Panics
    ///
    /// Panics if the variable is unset or the database is unreachable.
    pub async fn postgres() -> Self {
        let url = std::env::var("MAISON_TEST_DATABASE_URL")
            .expect("MAISON_TEST_DATABASE_URL must be set");
        let pool = db::create_pool(&SecretString::from(url))
            .await
            .expect("Failed to connect to test database");
        sqlx::migrate!("../storefront/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let dir = temp_dir();
        let state = AppState::build(
            config_for(&dir),
            Backend::Postgres,
            builtin_catalog(),
            Arc::new(PgOrderRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool)),
        );
        Self { dir, state }
    }

    /// A product from the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the id is not in the catalog.
    #[must_use]
    pub fn product(&self, id: &str) -> &Product {
        self.state
            .catalog()
            .get(&ProductId::new(id))
            .expect("product exists")
    }
}

/// The built-in catalog with one product repriced.
///
/// # Panics
///
/// Panics if the id is unknown.
#[must_use]
pub fn repriced(id: &str, price: Money) -> Catalog {
    let mut products = builtin_catalog().products().to_vec();
    let product = products
        .iter_mut()
        .find(|p| p.id.as_str() == id)
        .expect("product exists");
    product.price = price;
    Catalog::new(products).expect("repriced catalog is valid")
}

/// A complete shipping form for `email`.
#[must_use]
pub fn shipping_form(email: &str) -> AddressForm {
    AddressForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        address: "12 St James's Square".to_string(),
        city: "London".to_string(),
        state: "Greater London".to_string(),
        zip_code: "SW1Y 4JH".to_string(),
        phone: "+44 20 7946 0000".to_string(),
        email: email.to_string(),
        ..AddressForm::default()
    }
}

fn builtin_catalog() -> Catalog {
    Catalog::builtin().expect("built-in catalog is valid")
}

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn config_for(dir: &TempDir) -> StorefrontConfig {
    let data_dir = dir.path().display().to_string();
    StorefrontConfig::from_lookup(|key| (key == "MAISON_DATA_DIR").then(|| data_dir.clone()))
        .expect("default configuration is valid")
}
