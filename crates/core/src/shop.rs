//! The shop: every store, wired together once and shared by reference.
//!
//! [`Shop`] owns the catalog, stock ledger, coupon table, session store,
//! order history, latency injector and rate limiter. The transport layer
//! holds one `Shop` for the life of the process and calls its operations
//! with a session token; nothing here is global.
//!
//! # Locking
//!
//! Cart operations that can introduce a product reference take the catalog
//! gate for reading before locking the session; product deletion takes it
//! for writing while it scans every cart. Locks are always acquired in the
//! order gate, session, ledger.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::catalog::{BROKEN_IMAGE_REF, CatalogStore, NewProduct, Product, SortMode};
use crate::checkout::OrderHistory;
use crate::coupons::CouponTable;
use crate::error::{Result, ShopError};
use crate::latency::{DelayPoint, LatencyInjector};
use crate::pricing::{PricedCart, price_cart};
use crate::rate_limit::{RateLimiter, RateLimits};
use crate::seed::Seed;
use crate::session::{DEFAULT_SESSION_IDLE, Session, SessionState, SessionStore};
use crate::stock::StockLedger;
use crate::types::{BehaviorType, Identity, ProductId, SessionToken};

/// Tunables for a [`Shop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopSettings {
    /// How long a session may sit unused before eviction.
    pub session_idle: Duration,
    /// Delays for behavior-flagged identities.
    pub latency: LatencyInjector,
    /// Request limits per window.
    pub rate_limits: RateLimits,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            session_idle: DEFAULT_SESSION_IDLE,
            latency: LatencyInjector::default(),
            rate_limits: RateLimits::default(),
        }
    }
}

/// A product as listed to a shopper, with live availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub available: u32,
}

/// The commerce engine.
#[derive(Debug)]
pub struct Shop {
    pub(crate) catalog: CatalogStore,
    pub(crate) stock: StockLedger,
    pub(crate) coupons: CouponTable,
    pub(crate) sessions: SessionStore,
    pub(crate) orders: OrderHistory,
    pub(crate) latency: LatencyInjector,
    rate_limiter: RateLimiter,
    catalog_gate: RwLock<()>,
}

impl Shop {
    /// Build a shop from seed data.
    ///
    /// # Errors
    ///
    /// Returns an error if a seeded coupon is blank or its fraction is
    /// outside `[0, 1]`.
    pub fn new(seed: Seed, settings: ShopSettings) -> Result<Self> {
        let coupons = CouponTable::new(
            seed.coupons
                .iter()
                .map(|(code, fraction)| (code.as_str(), *fraction)),
        )?;
        let stock = StockLedger::new(seed.products.iter().map(|(p, qty)| (p.id, *qty)));
        let catalog = CatalogStore::new(seed.products.into_iter().map(|(p, _)| p));

        Ok(Self {
            catalog,
            stock,
            coupons,
            sessions: SessionStore::new(settings.session_idle),
            orders: OrderHistory::default(),
            latency: settings.latency,
            rate_limiter: RateLimiter::new(settings.rate_limits),
            catalog_gate: RwLock::new(()),
        })
    }

    /// The catalog store.
    #[must_use]
    pub const fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// The stock ledger.
    #[must_use]
    pub const fn stock(&self) -> &StockLedger {
        &self.stock
    }

    /// The coupon table.
    #[must_use]
    pub const fn coupons(&self) -> &CouponTable {
        &self.coupons
    }

    /// The order history.
    #[must_use]
    pub const fn orders(&self) -> &OrderHistory {
        &self.orders
    }

    /// The request rate limiter.
    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// The latency injector.
    #[must_use]
    pub const fn latency(&self) -> &LatencyInjector {
        &self.latency
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Open a session for an authenticated identity.
    ///
    /// Slow identities wait out their login delay first.
    pub async fn open_session(&self, identity: Identity) -> Arc<Session> {
        self.latency
            .inject(identity.behavior_type, DelayPoint::Login)
            .await;
        self.sessions.open(identity).await
    }

    /// Resolve a token to its identity.
    pub async fn resolve(&self, token: &SessionToken) -> Option<Identity> {
        self.sessions.resolve(token).await
    }

    /// End a session. Returns whether it existed.
    pub async fn close_session(&self, token: &SessionToken) -> bool {
        self.sessions.close(token).await
    }

    /// End every session of a user (account deletion).
    pub async fn close_sessions_for(&self, username: &str) -> usize {
        self.sessions.close_all_for(username).await
    }

    /// Look up a live session.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::SessionNotFound` if the token is unknown or expired.
    pub async fn session(&self, token: &SessionToken) -> Result<Arc<Session>> {
        self.sessions
            .get(token)
            .await
            .ok_or(ShopError::SessionNotFound)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products with availability.
    ///
    /// `problem` identities see broken image references; slow identities
    /// wait before the catalog is read.
    pub async fn list_products(
        &self,
        viewer: Option<&Identity>,
        sort: SortMode,
    ) -> Vec<ProductListing> {
        let behavior = self.read_delay(viewer).await;
        self.catalog
            .sorted(sort)
            .into_iter()
            .map(|product| self.listing(product, behavior))
            .collect()
    }

    /// One product with availability.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ProductNotFound` for an unknown id.
    pub async fn product(
        &self,
        viewer: Option<&Identity>,
        product_id: ProductId,
    ) -> Result<ProductListing> {
        let behavior = self.read_delay(viewer).await;
        let product = self
            .catalog
            .get(product_id)
            .ok_or(ShopError::ProductNotFound(product_id))?;
        Ok(self.listing(product, behavior))
    }

    async fn read_delay(&self, viewer: Option<&Identity>) -> BehaviorType {
        let behavior = viewer.map_or(BehaviorType::Standard, |v| v.behavior_type);
        self.latency.inject(behavior, DelayPoint::CatalogRead).await;
        behavior
    }

    fn listing(&self, mut product: Product, behavior: BehaviorType) -> ProductListing {
        if behavior == BehaviorType::Problem {
            BROKEN_IMAGE_REF.clone_into(&mut product.image_ref);
        }
        ProductListing {
            available: self.stock.get_available(product.id),
            product,
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The session's priced cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::SessionNotFound` for a dead token.
    pub async fn cart(&self, token: &SessionToken) -> Result<PricedCart> {
        let session = self.session(token).await?;
        let state = session.state().await;
        self.price(&state)
    }

    /// Add units of a product to the session's cart.
    ///
    /// # Errors
    ///
    /// See [`Cart::add`](crate::cart::Cart::add).
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &SessionToken,
        product_id: ProductId,
        quantity: Option<i64>,
    ) -> Result<PricedCart> {
        let _gate = self.catalog_gate.read().await;
        let session = self.session(token).await?;
        let mut state = session.state().await;
        state
            .cart
            .add(&self.catalog, &self.stock, product_id, quantity)?;
        self.price(&state)
    }

    /// Replace a cart line's quantity.
    ///
    /// # Errors
    ///
    /// See [`Cart::update_quantity`](crate::cart::Cart::update_quantity).
    #[instrument(skip(self, token))]
    pub async fn update_cart_quantity(
        &self,
        token: &SessionToken,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<PricedCart> {
        let session = self.session(token).await?;
        let mut state = session.state().await;
        state.cart.update_quantity(&self.stock, product_id, quantity)?;
        self.price(&state)
    }

    /// Take one unit of a product out of the cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ItemNotInCart` if the product has no line.
    #[instrument(skip(self, token))]
    pub async fn decrement_cart_line(
        &self,
        token: &SessionToken,
        product_id: ProductId,
    ) -> Result<PricedCart> {
        let session = self.session(token).await?;
        let mut state = session.state().await;
        state.cart.decrement_line(product_id)?;
        self.price(&state)
    }

    /// Reorder the cart's lines.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidProductId` unless `order` is a permutation
    /// of the cart's product ids.
    #[instrument(skip(self, token))]
    pub async fn reorder_cart(
        &self,
        token: &SessionToken,
        order: &[ProductId],
    ) -> Result<PricedCart> {
        let session = self.session(token).await?;
        let mut state = session.state().await;
        state.cart.reorder(order)?;
        self.price(&state)
    }

    /// Apply a coupon code to the session.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidCoupon` for an unknown code, after clearing
    /// any coupon applied before.
    #[instrument(skip(self, token))]
    pub async fn apply_coupon(&self, token: &SessionToken, code: &str) -> Result<PricedCart> {
        let session = self.session(token).await?;
        let mut state = session.state().await;
        self.coupons.apply(&mut state.applied_coupon, code)?;
        self.price(&state)
    }

    /// Remove the session's coupon, if any.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::SessionNotFound` for a dead token.
    #[instrument(skip(self, token))]
    pub async fn remove_coupon(&self, token: &SessionToken) -> Result<PricedCart> {
        let session = self.session(token).await?;
        let mut state = session.state().await;
        state.applied_coupon = None;
        self.price(&state)
    }

    fn price(&self, state: &SessionState) -> Result<PricedCart> {
        let coupon = state
            .applied_coupon
            .as_ref()
            .and_then(|code| self.coupons.get(code));
        price_cart(state.cart.lines(), &self.catalog, coupon.as_ref())
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Create a product with its starting stock.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidQuantity` for negative stock and
    /// `ShopError::InvalidInput` for a blank name or negative price.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub fn create_product(&self, new: NewProduct, stock: i64) -> Result<ProductListing> {
        let stock = u32::try_from(stock).map_err(|_| ShopError::InvalidQuantity(stock))?;
        let product = self.catalog.insert(new)?;
        self.stock.set_stock(product.id, i64::from(stock))?;
        info!(product_id = %product.id, stock, "product created");
        Ok(ProductListing {
            product,
            available: stock,
        })
    }

    /// Delete a product no cart refers to.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ProductNotFound` for an unknown id and
    /// `ShopError::ProductInUse` if any live cart holds it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<Product> {
        let _gate = self.catalog_gate.write().await;
        if !self.catalog.contains(product_id) {
            return Err(ShopError::ProductNotFound(product_id));
        }
        if self.sessions.any_cart_contains(product_id).await {
            return Err(ShopError::ProductInUse(product_id));
        }

        let product = self
            .catalog
            .remove(product_id)
            .ok_or(ShopError::ProductNotFound(product_id))?;
        self.stock.remove(product_id);
        info!(%product_id, "product deleted");
        Ok(product)
    }

    /// Override a product's stock.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ProductNotFound` for an unknown id and
    /// `ShopError::InvalidQuantity` for a negative quantity.
    #[instrument(skip(self))]
    pub async fn set_stock(&self, product_id: ProductId, quantity: i64) -> Result<u32> {
        let _gate = self.catalog_gate.read().await;
        if !self.catalog.contains(product_id) {
            return Err(ShopError::ProductNotFound(product_id));
        }
        let quantity = self.stock.set_stock(product_id, quantity)?;
        info!(%product_id, quantity, "stock set");
        Ok(quantity)
    }
}
