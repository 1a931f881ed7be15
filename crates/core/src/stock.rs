//! Stock ledger.
//!
//! The ledger is the one table shared by every session. All reads and writes
//! go through a single mutex, so each read-check-decrement in [`reserve`] and
//! each multi-line [`reserve_all`] is one critical section: two checkouts
//! racing on the same product can never both observe the same quantity.
//!
//! [`reserve`]: StockLedger::reserve
//! [`reserve_all`]: StockLedger::reserve_all

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{Result, ShopError};
use crate::types::ProductId;

/// Per-product remaining quantities.
#[derive(Debug, Default)]
pub struct StockLedger {
    entries: Mutex<HashMap<ProductId, u32>>,
}

impl StockLedger {
    /// Create a ledger with the given starting quantities.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (ProductId, u32)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Current quantity for a product, 0 if the product is unknown.
    #[must_use]
    pub fn get_available(&self, product_id: ProductId) -> u32 {
        self.lock().get(&product_id).copied().unwrap_or(0)
    }

    /// Decrement one product's quantity if enough is available.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InsufficientStock` with the current quantity if
    /// fewer than `amount` units remain. Nothing is decremented in that case.
    pub fn reserve(&self, product_id: ProductId, amount: u32) -> Result<()> {
        let mut entries = self.lock();
        let available = entries.get(&product_id).copied().unwrap_or(0);
        if available < amount {
            return Err(ShopError::InsufficientStock {
                product_id,
                available,
            });
        }
        entries.insert(product_id, available - amount);
        debug!(%product_id, amount, remaining = available - amount, "stock reserved");
        Ok(())
    }

    /// Reserve every requested line, or none of them.
    ///
    /// Repeated product ids are summed before checking. The whole request is
    /// validated before the first decrement, inside the same critical section.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InsufficientStock` for the first product (in id
    /// order) that cannot be covered. The ledger is left untouched.
    pub fn reserve_all(&self, lines: &[(ProductId, u32)]) -> Result<()> {
        let mut requested: BTreeMap<ProductId, u32> = BTreeMap::new();
        for &(product_id, amount) in lines {
            let total = requested.entry(product_id).or_insert(0);
            *total = total.saturating_add(amount);
        }

        let mut entries = self.lock();
        for (&product_id, &amount) in &requested {
            let available = entries.get(&product_id).copied().unwrap_or(0);
            if available < amount {
                return Err(ShopError::InsufficientStock {
                    product_id,
                    available,
                });
            }
        }

        for (product_id, amount) in requested {
            if let Some(quantity) = entries.get_mut(&product_id) {
                *quantity -= amount;
            }
        }
        debug!(lines = lines.len(), "stock reserved for checkout");
        Ok(())
    }

    /// Admin override of a product's quantity.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidQuantity` if `quantity` is negative or does
    /// not fit the ledger's range.
    pub fn set_stock(&self, product_id: ProductId, quantity: i64) -> Result<u32> {
        let quantity = u32::try_from(quantity).map_err(|_| ShopError::InvalidQuantity(quantity))?;
        self.lock().insert(product_id, quantity);
        Ok(quantity)
    }

    /// Drop a product's entry, returning its last quantity.
    pub fn remove(&self, product_id: ProductId) -> Option<u32> {
        self.lock().remove(&product_id)
    }

    /// Copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<ProductId, u32> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProductId, u32>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    const A: ProductId = ProductId::new(0);
    const B: ProductId = ProductId::new(1);

    #[test]
    fn test_unknown_product_has_no_stock() {
        let ledger = StockLedger::default();
        assert_eq!(ledger.get_available(A), 0);
        assert!(matches!(
            ledger.reserve(A, 1),
            Err(ShopError::InsufficientStock { available: 0, .. })
        ));
    }

    #[test]
    fn test_reserve_decrements() {
        let ledger = StockLedger::new([(A, 5)]);
        ledger.reserve(A, 3).unwrap();
        assert_eq!(ledger.get_available(A), 2);
        ledger.reserve(A, 2).unwrap();
        assert_eq!(ledger.get_available(A), 0);
    }

    #[test]
    fn test_reserve_fails_without_decrement() {
        let ledger = StockLedger::new([(A, 2)]);
        let err = ledger.reserve(A, 3).unwrap_err();
        assert_eq!(
            err,
            ShopError::InsufficientStock {
                product_id: A,
                available: 2
            }
        );
        assert_eq!(ledger.get_available(A), 2);
    }

    #[test]
    fn test_reserve_all_is_all_or_nothing() {
        let ledger = StockLedger::new([(A, 5), (B, 1)]);
        let err = ledger.reserve_all(&[(A, 3), (B, 2)]).unwrap_err();
        assert!(matches!(
            err,
            ShopError::InsufficientStock { product_id, available: 1 } if product_id == B
        ));
        assert_eq!(ledger.get_available(A), 5);
        assert_eq!(ledger.get_available(B), 1);

        ledger.reserve_all(&[(A, 3), (B, 1)]).unwrap();
        assert_eq!(ledger.get_available(A), 2);
        assert_eq!(ledger.get_available(B), 0);
    }

    #[test]
    fn test_reserve_all_sums_repeated_lines() {
        let ledger = StockLedger::new([(A, 4)]);
        assert!(ledger.reserve_all(&[(A, 3), (A, 2)]).is_err());
        assert_eq!(ledger.get_available(A), 4);
    }

    #[test]
    fn test_set_stock() {
        let ledger = StockLedger::default();
        assert_eq!(ledger.set_stock(A, 7).unwrap(), 7);
        assert_eq!(ledger.get_available(A), 7);
        assert_eq!(
            ledger.set_stock(A, -1).unwrap_err(),
            ShopError::InvalidQuantity(-1)
        );
        assert_eq!(ledger.get_available(A), 7);
    }

    #[test]
    fn test_concurrent_reserves_never_oversell() {
        let ledger = Arc::new(StockLedger::new([(A, 100)]));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || (0..10).filter(|_| ledger.reserve(A, 1).is_ok()).count())
            })
            .collect();

        let reserved: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(reserved, 100);
        assert_eq!(ledger.get_available(A), 0);
    }
}
