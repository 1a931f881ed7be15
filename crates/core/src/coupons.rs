//! Coupon table.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};

/// A normalized coupon code: trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Normalize a code as typed by a client.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidCoupon` if the code is blank.
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(ShopError::InvalidCoupon(String::new()));
        }
        Ok(Self(code.to_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A coupon and the fraction of the item total it takes off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: CouponCode,
    pub discount_fraction: Decimal,
}

/// Known coupon codes. Fixed for the lifetime of the shop.
#[derive(Debug, Default)]
pub struct CouponTable {
    coupons: HashMap<CouponCode, Decimal>,
}

impl CouponTable {
    /// Build a table from `(code, fraction)` pairs.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidCoupon` for a blank code and
    /// `ShopError::InvalidInput` for a fraction outside `[0, 1]`.
    pub fn new<'a>(coupons: impl IntoIterator<Item = (&'a str, Decimal)>) -> Result<Self> {
        let mut table = HashMap::new();
        for (raw, fraction) in coupons {
            let code = CouponCode::parse(raw)?;
            if fraction < Decimal::ZERO || fraction > Decimal::ONE {
                return Err(ShopError::InvalidInput(format!(
                    "discount for {code} must be between 0 and 1"
                )));
            }
            table.insert(code, fraction);
        }
        Ok(Self { coupons: table })
    }

    /// Look up a code, normalizing it first.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Option<Coupon> {
        let code = CouponCode::parse(raw).ok()?;
        self.get(&code)
    }

    /// Look up an already-normalized code.
    #[must_use]
    pub fn get(&self, code: &CouponCode) -> Option<Coupon> {
        self.coupons.get(code).map(|&discount_fraction| Coupon {
            code: code.clone(),
            discount_fraction,
        })
    }

    /// Apply a code to a session's coupon slot.
    ///
    /// An unknown code clears whatever was applied before.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidCoupon` if the code is not in the table.
    pub fn apply(&self, slot: &mut Option<CouponCode>, raw: &str) -> Result<Coupon> {
        match self.lookup(raw) {
            Some(coupon) => {
                *slot = Some(coupon.code.clone());
                Ok(coupon)
            }
            None => {
                *slot = None;
                Err(ShopError::InvalidCoupon(raw.trim().to_owned()))
            }
        }
    }

    /// Number of codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}
