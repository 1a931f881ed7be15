//! Pricing and coupon engine.
//!
//! [`price_cart`] derives the priced cart projection from a cart snapshot.
//! It is a pure function: the same lines, catalog and coupon always produce
//! the same output.
//!
//! Every stage is rounded half-up to two places as it is produced:
//!
//! ```text
//! line_total = round2(price * quantity)
//! item_total = round2(sum(line_total))
//! discount   = round2(item_total * fraction)   (0 without a coupon)
//! subtotal   = round2(item_total - discount)
//! tax        = round2(subtotal * 0.08)
//! total      = round2(subtotal + tax)
//! ```

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::CartLine;
use crate::catalog::ProductLookup;
use crate::coupons::Coupon;
use crate::error::{Result, ShopError};
use crate::types::{ProductId, TAX_RATE, round2};

/// One cart line with its price resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    pub image_ref: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// The priced cart projection returned by every cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub item_count: u32,
    pub item_total: Decimal,
    pub coupon: Option<Coupon>,
    pub discount: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Price a cart snapshot.
///
/// # Errors
///
/// Returns `ShopError::ProductNotFound` if a line references a product the
/// catalog no longer has.
pub fn price_cart<C>(lines: &[CartLine], catalog: &C, coupon: Option<&Coupon>) -> Result<PricedCart>
where
    C: ProductLookup + ?Sized,
{
    let lines = lines
        .iter()
        .map(|line| {
            let product = catalog
                .product(line.product_id)
                .ok_or(ShopError::ProductNotFound(line.product_id))?;
            Ok(PricedLine {
                product_id: product.id,
                line_total: round2(product.price * Decimal::from(line.quantity)),
                name: product.name,
                image_ref: product.image_ref,
                unit_price: product.price,
                quantity: line.quantity,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let item_count = lines.iter().map(|line| line.quantity).sum();
    let item_total = round2(lines.iter().map(|line| line.line_total).sum());
    let discount = round2(coupon.map_or(Decimal::ZERO, |c| item_total * c.discount_fraction));
    let subtotal = round2(item_total - discount);
    let tax = round2(subtotal * TAX_RATE);
    let total = round2(subtotal + tax);

    Ok(PricedCart {
        lines,
        item_count,
        item_total,
        coupon: coupon.cloned(),
        discount,
        subtotal,
        tax,
        total,
    })
}
