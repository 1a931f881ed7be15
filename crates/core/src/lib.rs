//! Practice Shop Core - the commerce engine behind the test-fixture shop.
//!
//! This crate owns every piece of shop state: the product catalog, the stock
//! ledger, coupon codes, login sessions with their carts, and the order
//! history. It knows nothing about HTTP; `practice-shop-server` maps requests
//! onto [`Shop`] operations and [`ShopError`]s onto responses.
//!
//! # Architecture
//!
//! A single [`Shop`] value is constructed at startup from a [`Seed`] and
//! shared by reference. Stock is the only state shared between sessions and
//! lives behind one lock, so reservations can never oversell. Per-session
//! state (cart, coupon, last order) has its own async lock.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, identities and money helpers
//! - [`catalog`] - Products and sorting
//! - [`stock`] - Available quantities and atomic reservation
//! - [`coupons`] - Discount codes
//! - [`cart`] - Cart lines and their rules
//! - [`pricing`] - Totals, discount and tax
//! - [`session`] - Login sessions
//! - [`checkout`] - Order placement and history
//! - [`rate_limit`] - Per-client request admission
//! - [`latency`] - Artificial delays for behavior-flagged users
//! - [`shop`] - The facade tying it together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupons;
pub mod error;
pub mod latency;
pub mod pricing;
pub mod rate_limit;
pub mod seed;
pub mod session;
pub mod shop;
pub mod stock;
pub mod types;

pub use cart::{Cart, CartLine, MAX_LINE_QUANTITY};
pub use catalog::{NewProduct, Product, SortMode};
pub use checkout::{CustomerInfo, Order};
pub use coupons::{Coupon, CouponCode};
pub use error::{ErrorKind, Result, ShopError};
pub use latency::LatencyInjector;
pub use pricing::PricedCart;
pub use rate_limit::{RateLimits, RateScope, Tier};
pub use seed::Seed;
pub use shop::{ProductListing, Shop, ShopSettings};
pub use types::*;
