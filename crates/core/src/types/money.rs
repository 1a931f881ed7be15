//! Decimal money helpers.
//!
//! All amounts are [`Decimal`] values in the store currency's standard unit
//! (dollars, not cents). Every derived amount is rounded half-up to two
//! places at the stage where it is produced, so intermediate rounding is part
//! of the observable result.

use rust_decimal::{Decimal, RoundingStrategy};

/// Sales tax applied to the discounted subtotal (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Round to two decimal places, half-up, and normalize the scale to 2.
///
/// `2.3976` becomes `2.40`, `0.125` becomes `0.13`, and `30` becomes `30.00`.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
