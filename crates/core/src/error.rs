//! Engine error taxonomy.
//!
//! Every failure the engine reports is a [`ShopError`] variant with a stable
//! machine-readable [`code`](ShopError::code) and a [`kind`](ShopError::kind)
//! the transport layer maps onto a status. Nothing is retried internally.

use serde::Serialize;
use thiserror::Error;

use crate::types::ProductId;

/// Broad error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing input.
    Validation,
    /// Unknown product, cart line, session or order.
    NotFound,
    /// The request conflicts with current state (stock, caps, references).
    Conflict,
    /// Missing or invalid identity.
    Auth,
    /// Too many requests.
    RateLimit,
    /// Deliberate failure for a behavior-flagged identity.
    InjectedFailure,
}

/// Errors produced by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("invalid coupon code: {0}")]
    InvalidCoupon(String),

    #[error("product ids must be exactly the products in the cart")]
    InvalidProductId,

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("product {0} is not in the cart")]
    ItemNotInCart(ProductId),

    #[error("no order has been placed in this session")]
    OrderNotFound,

    #[error("session not found or expired")]
    SessionNotFound,

    #[error("insufficient stock for product {product_id}: {available} available")]
    InsufficientStock { product_id: ProductId, available: u32 },

    #[error("quantity of product {product_id} cannot exceed {max}")]
    MaxQuantityExceeded { product_id: ProductId, max: u32 },

    #[error("product {0} is in an active cart")]
    ProductInUse(ProductId),

    #[error("rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("checkout failed: simulated server error")]
    InjectedFailure,
}

impl ShopError {
    /// The category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_)
            | Self::MissingFields(_)
            | Self::EmptyCart
            | Self::InvalidQuantity(_)
            | Self::InvalidCoupon(_)
            | Self::InvalidProductId => ErrorKind::Validation,
            Self::ProductNotFound(_) | Self::ItemNotInCart(_) | Self::OrderNotFound => {
                ErrorKind::NotFound
            }
            Self::SessionNotFound => ErrorKind::Auth,
            Self::InsufficientStock { .. }
            | Self::MaxQuantityExceeded { .. }
            | Self::ProductInUse(_) => ErrorKind::Conflict,
            Self::RateLimited { .. } => ErrorKind::RateLimit,
            Self::InjectedFailure => ErrorKind::InjectedFailure,
        }
    }

    /// Stable code clients can match on.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::MissingFields(_) => "MISSING_FIELDS",
            Self::EmptyCart => "EMPTY_CART",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InvalidCoupon(_) => "INVALID_COUPON",
            Self::InvalidProductId => "INVALID_PRODUCT_ID",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::ItemNotInCart(_) => "ITEM_NOT_IN_CART",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::SessionNotFound => "UNAUTHORIZED",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::MaxQuantityExceeded { .. } => "MAX_QUANTITY_EXCEEDED",
            Self::ProductInUse(_) => "PRODUCT_IN_USE",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::InjectedFailure => "INJECTED_FAILURE",
        }
    }
}

/// Result type alias for [`ShopError`].
pub type Result<T> = std::result::Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShopError::InsufficientStock {
            product_id: ProductId::new(3),
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for product 3: 10 available"
        );

        let err = ShopError::MissingFields(vec!["firstName".into(), "postalCode".into()]);
        assert_eq!(
            err.to_string(),
            "missing required fields: firstName, postalCode"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ShopError::EmptyCart.kind(), ErrorKind::Validation);
        assert_eq!(
            ShopError::ItemNotInCart(ProductId::new(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ShopError::ProductInUse(ProductId::new(1)).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(ShopError::SessionNotFound.kind(), ErrorKind::Auth);
        assert_eq!(
            ShopError::RateLimited {
                retry_after_seconds: 5
            }
            .kind(),
            ErrorKind::RateLimit
        );
        assert_eq!(
            ShopError::InjectedFailure.kind(),
            ErrorKind::InjectedFailure
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ShopError::EmptyCart.code(), "EMPTY_CART");
        assert_eq!(ShopError::InvalidProductId.code(), "INVALID_PRODUCT_ID");
        assert_eq!(ShopError::InjectedFailure.code(), "INJECTED_FAILURE");
    }
}
