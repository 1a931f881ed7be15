//! Application state shared across handlers.

use std::sync::Arc;

use practice_shop_core::{Seed, Shop, ShopError};

use crate::config::ShopConfig;
use crate::services::auth::{AuthError, HashCost, UserDirectory};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid seed data: {0}")]
    Shop(#[from] ShopError),
    #[error("could not seed accounts: {0}")]
    Accounts(#[from] AuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// commerce engine, the account directory and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    shop: Shop,
    users: UserDirectory,
}

impl AppState {
    /// Create the application state with the demo catalog and seed accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed data or seed password is invalid.
    pub fn new(config: ShopConfig, cost: HashCost) -> Result<Self, StateError> {
        let shop = Shop::new(Seed::demo(), config.shop_settings())?;
        let users = UserDirectory::seeded(&config.seed_password, cost)?;
        Ok(Self::from_parts(config, shop, users))
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn from_parts(config: ShopConfig, shop: Shop, users: UserDirectory) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                shop,
                users,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    /// Get a reference to the commerce engine.
    #[must_use]
    pub fn shop(&self) -> &Shop {
        &self.inner.shop
    }

    /// Get a reference to the account directory.
    #[must_use]
    pub fn users(&self) -> &UserDirectory {
        &self.inner.users
    }
}
