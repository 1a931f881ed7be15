//! Core types for Practice Shop.
//!
//! This module provides type-safe wrappers for ids, money and identities.

pub mod id;
pub mod identity;
pub mod money;

pub use id::{OrderId, ProductId, SessionToken};
pub use identity::{BehaviorType, Identity, Role};
pub use money::{TAX_RATE, round2};
