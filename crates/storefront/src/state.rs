//! Application state shared across commands.

use std::sync::Arc;

use crate::cart::{CartStore, FileStorage};
use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::db::{self, MemoryRepository, OrderRepository, PgOrderRepository, PgUserRepository, UserRepository};
use crate::error::AppError;
use crate::orders::OrderService;
use crate::services::{AuthService, ProfileService};

/// Where orders and accounts are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    /// Process-local; nothing survives the process.
    Memory,
}

/// Application state shared across all commands.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Backend,
    catalog: Catalog,
    orders: OrderService,
    auth: AuthService,
    profiles: ProfileService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.inner.backend)
            .field("products", &self.inner.catalog.len())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the state for `config`.
    ///
    /// Connects to `PostgreSQL` when a database URL is configured and falls
    /// back to the in-memory backend otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in catalog is invalid or the database
    /// cannot be reached.
    pub async fn connect(config: StorefrontConfig) -> Result<Self, AppError> {
        let catalog = Catalog::builtin()?;

        if let Some(url) = &config.database_url {
            let pool = db::create_pool(url)
                .await
                .map_err(db::RepositoryError::from)?;
            tracing::info!("Database pool created");

            let orders = Arc::new(PgOrderRepository::new(pool.clone()));
            let users = Arc::new(PgUserRepository::new(pool));
            return Ok(Self::build(config, Backend::Postgres, catalog, orders, users));
        }

        tracing::warn!("No database configured; orders and accounts will not persist");
        let repo = Arc::new(MemoryRepository::new());
        Ok(Self::build(config, Backend::Memory, catalog, repo.clone(), repo))
    }

    /// Build the state over explicit repositories.
    #[must_use]
    pub fn build(
        config: StorefrontConfig,
        backend: Backend,
        catalog: Catalog,
        orders: Arc<dyn OrderRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                catalog,
                orders: OrderService::new(orders),
                auth: AuthService::new(users.clone()),
                profiles: ProfileService::new(users),
            }),
        }
    }

    /// Open the customer's cart from the configured data directory.
    #[must_use]
    pub fn open_cart(&self) -> CartStore {
        CartStore::open(FileStorage::new(self.inner.config.data_dir.clone()))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.inner.backend
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn profiles(&self) -> &ProfileService {
        &self.inner.profiles
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_database_uses_memory() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig::from_lookup(|key| {
            (key == "MAISON_DATA_DIR").then(|| dir.path().display().to_string())
        })
        .unwrap();

        let state = AppState::connect(config).await.unwrap();
        assert_eq!(state.backend(), Backend::Memory);
        assert_eq!(state.catalog().len(), 11);
        assert!(state.open_cart().is_empty());
    }
}
