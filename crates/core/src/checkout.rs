//! Checkout engine and order history.
//!
//! A checkout moves through `Validating -> Reserving -> Finalized`. Any
//! failure returns the session to idle with nothing changed: the stock
//! reservation is all-or-nothing, and the order, cart reset and history
//! append only happen once every line is reserved.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{Span, info, instrument, warn};

use crate::coupons::Coupon;
use crate::error::{Result, ShopError};
use crate::latency::DelayPoint;
use crate::pricing::{PricedLine, price_cart};
use crate::shop::Shop;
use crate::types::{BehaviorType, OrderId, SessionToken};

/// Shipping contact collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub postal_code: String,
}

impl CustomerInfo {
    /// Names of the fields left blank, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("postalCode", &self.postal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_owned())
        .collect()
    }

    fn trimmed(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
        }
    }
}

/// A finalized order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub username: String,
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLine>,
    pub coupon: Option<Coupon>,
    pub item_count: u32,
    pub item_total: Decimal,
    pub discount: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub placed_at: DateTime<Utc>,
}

/// A priced line as recorded on an order.
pub type OrderLine = PricedLine;

/// Checkout progress, recorded on the checkout span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    Idle,
    Validating,
    Reserving,
    Finalized,
}

impl CheckoutPhase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Reserving => "reserving",
            Self::Finalized => "finalized",
        }
    }

    fn enter(self) {
        Span::current().record("phase", self.as_str());
    }
}

/// Append-only log of every order placed since startup.
#[derive(Debug, Default)]
pub struct OrderHistory {
    orders: RwLock<Vec<Order>>,
    sequence: AtomicU64,
}

impl OrderHistory {
    /// Allocate the next order id.
    pub fn next_id(&self) -> OrderId {
        OrderId::from_sequence(self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Record an order.
    pub fn append(&self, order: Order) {
        self.orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order);
    }

    /// Orders placed by one user, oldest first.
    #[must_use]
    pub fn for_user(&self, username: &str) -> Vec<Order> {
        self.read_orders()
            .iter()
            .filter(|order| order.username == username)
            .cloned()
            .collect()
    }

    /// Every order, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<Order> {
        self.read_orders().clone()
    }

    /// Number of orders placed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_orders().len()
    }

    /// Whether no order has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_orders().is_empty()
    }

    fn read_orders(&self) -> std::sync::RwLockReadGuard<'_, Vec<Order>> {
        self.orders.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Shop {
    /// Place an order for everything in the session's cart.
    ///
    /// # Errors
    ///
    /// - `ShopError::SessionNotFound` if the token is not live
    /// - `ShopError::MissingFields` if a customer field is blank
    /// - `ShopError::EmptyCart` if there is nothing to buy
    /// - `ShopError::InjectedFailure` for `error` identities, after a delay
    /// - `ShopError::InsufficientStock` if any line cannot be reserved
    #[instrument(skip_all, fields(username = tracing::field::Empty, phase = CheckoutPhase::Idle.as_str()))]
    pub async fn checkout(&self, token: &SessionToken, customer: CustomerInfo) -> Result<Order> {
        let session = self.session(token).await?;
        let identity = session.identity();
        Span::current().record("username", identity.username.as_str());

        CheckoutPhase::Validating.enter();
        let mut state = session.state().await;
        let missing = customer.missing_fields();
        if !missing.is_empty() {
            CheckoutPhase::Idle.enter();
            return Err(ShopError::MissingFields(missing));
        }
        if state.cart.is_empty() {
            CheckoutPhase::Idle.enter();
            return Err(ShopError::EmptyCart);
        }

        if identity.behavior_type == BehaviorType::Error {
            drop(state);
            self.latency
                .inject(identity.behavior_type, DelayPoint::CheckoutFailure)
                .await;
            CheckoutPhase::Idle.enter();
            warn!("injected checkout failure");
            return Err(ShopError::InjectedFailure);
        }

        CheckoutPhase::Reserving.enter();
        let coupon = state
            .applied_coupon
            .as_ref()
            .and_then(|code| self.coupons.get(code));
        let priced = price_cart(state.cart.lines(), &self.catalog, coupon.as_ref())?;
        let request: Vec<_> = state
            .cart
            .lines()
            .iter()
            .map(|line| (line.product_id, line.quantity))
            .collect();
        if let Err(err) = self.stock.reserve_all(&request) {
            CheckoutPhase::Idle.enter();
            return Err(err);
        }

        let order = Order {
            order_id: self.orders.next_id(),
            username: identity.username.clone(),
            customer: customer.trimmed(),
            lines: priced.lines,
            coupon: priced.coupon,
            item_count: priced.item_count,
            item_total: priced.item_total,
            discount: priced.discount,
            subtotal: priced.subtotal,
            tax: priced.tax,
            total: priced.total,
            placed_at: Utc::now(),
        };

        self.orders.append(order.clone());
        state.last_order = Some(order.clone());
        state.cart.clear();
        state.applied_coupon = None;
        CheckoutPhase::Finalized.enter();

        info!(order_id = %order.order_id, total = %order.total, "order placed");
        Ok(order)
    }

    /// The last order placed in this session.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::SessionNotFound` for a dead token and
    /// `ShopError::OrderNotFound` if the session has not checked out yet.
    pub async fn last_order(&self, token: &SessionToken) -> Result<Order> {
        let session = self.session(token).await?;
        let state = session.state().await;
        state.last_order.clone().ok_or(ShopError::OrderNotFound)
    }

    /// Orders placed by the session's user, across all their sessions.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::SessionNotFound` for a dead token.
    pub async fn order_history(&self, token: &SessionToken) -> Result<Vec<Order>> {
        let session = self.session(token).await?;
        Ok(self.orders.for_user(&session.identity().username))
    }

    /// Every order placed since startup (admin).
    #[must_use]
    pub fn all_orders(&self) -> Vec<Order> {
        self.orders.all()
    }
}
