//! Cart engine.
//!
//! A [`Cart`] is an ordered list of lines, at most one per product. Adding
//! stock to a cart does not reserve it; availability is checked against the
//! ledger on every mutation and reserved only at checkout.
//!
//! Removing from the cart is a decrement: [`Cart::decrement_line`] takes one
//! unit off a line and drops the line when it reaches zero. There is no
//! whole-line delete.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogStore;
use crate::error::{Result, ShopError};
use crate::stock::StockLedger;
use crate::types::ProductId;

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// One product-quantity pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A session's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

/// Check a requested quantity is within `1..=MAX_LINE_QUANTITY`.
fn requested_quantity(quantity: i64) -> Result<u32> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| (1..=MAX_LINE_QUANTITY).contains(q))
        .ok_or_else(|| {
            ShopError::InvalidInput(format!(
                "quantity must be between 1 and {MAX_LINE_QUANTITY}, got {quantity}"
            ))
        })
}

impl Cart {
    /// Lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity held for a product, if it has a line.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<u32> {
        self.line(product_id).map(|line| line.quantity)
    }

    /// Whether the cart has a line for this product.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Add units of a product, merging into an existing line.
    ///
    /// `quantity` defaults to 1.
    ///
    /// # Errors
    ///
    /// - `ShopError::InvalidInput` if the quantity is outside `1..=10`
    /// - `ShopError::ProductNotFound` if the catalog has no such product
    /// - `ShopError::InsufficientStock` if the line would exceed the ledger
    /// - `ShopError::MaxQuantityExceeded` if the line would exceed 10
    pub fn add(
        &mut self,
        catalog: &CatalogStore,
        stock: &StockLedger,
        product_id: ProductId,
        quantity: Option<i64>,
    ) -> Result<()> {
        let quantity = requested_quantity(quantity.unwrap_or(1))?;
        if !catalog.contains(product_id) {
            return Err(ShopError::ProductNotFound(product_id));
        }

        let current = self.quantity_of(product_id).unwrap_or(0);
        let wanted = current + quantity;

        let available = stock.get_available(product_id);
        if wanted > available {
            return Err(ShopError::InsufficientStock {
                product_id,
                available,
            });
        }
        if wanted > MAX_LINE_QUANTITY {
            return Err(ShopError::MaxQuantityExceeded {
                product_id,
                max: MAX_LINE_QUANTITY,
            });
        }

        match self.line_mut(product_id) {
            Some(line) => line.quantity = wanted,
            None => self.lines.push(CartLine {
                product_id,
                quantity: wanted,
            }),
        }
        Ok(())
    }

    /// Replace a line's quantity.
    ///
    /// # Errors
    ///
    /// - `ShopError::InvalidInput` if the quantity is outside `1..=10`
    /// - `ShopError::ItemNotInCart` if the product has no line
    /// - `ShopError::InsufficientStock` if the ledger cannot cover it
    pub fn update_quantity(
        &mut self,
        stock: &StockLedger,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<()> {
        let quantity = requested_quantity(quantity)?;
        if !self.contains(product_id) {
            return Err(ShopError::ItemNotInCart(product_id));
        }

        let available = stock.get_available(product_id);
        if quantity > available {
            return Err(ShopError::InsufficientStock {
                product_id,
                available,
            });
        }

        if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Take one unit off a line, dropping the line when it reaches zero.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ItemNotInCart` if the product has no line.
    pub fn decrement_line(&mut self, product_id: ProductId) -> Result<()> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or(ShopError::ItemNotInCart(product_id))?;

        let remove = self.lines.get_mut(index).is_some_and(|line| {
            line.quantity -= 1;
            line.quantity == 0
        });
        if remove {
            self.lines.remove(index);
        }
        Ok(())
    }

    /// Reorder lines to follow `order`.
    ///
    /// `order` must be a permutation of the cart's product ids: same set, no
    /// duplicates, nothing missing. Quantities are untouched.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidProductId` otherwise; the cart is unchanged.
    pub fn reorder(&mut self, order: &[ProductId]) -> Result<()> {
        if order.len() != self.lines.len() {
            return Err(ShopError::InvalidProductId);
        }

        let mut reordered = Vec::with_capacity(order.len());
        for (position, product_id) in order.iter().enumerate() {
            let duplicate = order.iter().take(position).any(|seen| seen == product_id);
            let line = self.line(*product_id).copied();
            match line {
                Some(line) if !duplicate => reordered.push(line),
                _ => return Err(ShopError::InvalidProductId),
            }
        }

        self.lines = reordered;
        Ok(())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::Product;

    fn pid(id: u32) -> ProductId {
        ProductId::new(id)
    }

    fn fixtures(stock: u32) -> (CatalogStore, StockLedger) {
        let catalog = CatalogStore::new((0..3).map(|id| Product {
            id: pid(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::new(999, 2),
            image_ref: String::new(),
        }));
        let ledger = StockLedger::new((0..3).map(|id| (pid(id), stock)));
        (catalog, ledger)
    }

    #[test]
    fn test_add_defaults_to_one_and_merges() {
        let (catalog, ledger) = fixtures(10);
        let mut cart = Cart::default();
        cart.add(&catalog, &ledger, pid(0), None).unwrap();
        cart.add(&catalog, &ledger, pid(0), Some(2)).unwrap();
        assert_eq!(cart.lines(), &[CartLine { product_id: pid(0), quantity: 3 }]);
    }

    #[test]
    fn test_add_over_stock_keeps_quantity() {
        let (catalog, ledger) = fixtures(10);
        let mut cart = Cart::default();
        cart.add(&catalog, &ledger, pid(0), Some(5)).unwrap();
        let err = cart.add(&catalog, &ledger, pid(0), Some(6)).unwrap_err();
        assert_eq!(
            err,
            ShopError::InsufficientStock {
                product_id: pid(0),
                available: 10
            }
        );
        assert_eq!(cart.quantity_of(pid(0)), Some(5));
    }

    #[test]
    fn test_add_over_line_cap() {
        let (catalog, ledger) = fixtures(50);
        let mut cart = Cart::default();
        cart.add(&catalog, &ledger, pid(1), Some(8)).unwrap();
        let err = cart.add(&catalog, &ledger, pid(1), Some(3)).unwrap_err();
        assert!(matches!(err, ShopError::MaxQuantityExceeded { max: 10, .. }));
        assert_eq!(cart.quantity_of(pid(1)), Some(8));
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let (catalog, ledger) = fixtures(10);
        let mut cart = Cart::default();
        for quantity in [0, -1, 11] {
            assert!(matches!(
                cart.add(&catalog, &ledger, pid(0), Some(quantity)),
                Err(ShopError::InvalidInput(_))
            ));
        }
        assert_eq!(
            cart.add(&catalog, &ledger, pid(7), None).unwrap_err(),
            ShopError::ProductNotFound(pid(7))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_replaces() {
        let (catalog, ledger) = fixtures(4);
        let mut cart = Cart::default();
        cart.add(&catalog, &ledger, pid(2), Some(3)).unwrap();
        cart.update_quantity(&ledger, pid(2), 1).unwrap();
        assert_eq!(cart.quantity_of(pid(2)), Some(1));

        assert!(matches!(
            cart.update_quantity(&ledger, pid(2), 5),
            Err(ShopError::InsufficientStock { available: 4, .. })
        ));
        assert!(matches!(
            cart.update_quantity(&ledger, pid(2), 0),
            Err(ShopError::InvalidInput(_))
        ));
        assert_eq!(
            cart.update_quantity(&ledger, pid(1), 1).unwrap_err(),
            ShopError::ItemNotInCart(pid(1))
        );
        assert_eq!(cart.quantity_of(pid(2)), Some(1));
    }

    #[test]
    fn test_decrement_line() {
        let (catalog, ledger) = fixtures(10);
        let mut cart = Cart::default();
        cart.add(&catalog, &ledger, pid(0), Some(2)).unwrap();
        cart.decrement_line(pid(0)).unwrap();
        assert_eq!(cart.quantity_of(pid(0)), Some(1));
        cart.decrement_line(pid(0)).unwrap();
        assert!(cart.is_empty());
        assert_eq!(
            cart.decrement_line(pid(0)).unwrap_err(),
            ShopError::ItemNotInCart(pid(0))
        );
    }

    #[test]
    fn test_reorder_is_a_permutation() {
        let (catalog, ledger) = fixtures(10);
        let mut cart = Cart::default();
        cart.add(&catalog, &ledger, pid(0), Some(1)).unwrap();
        cart.add(&catalog, &ledger, pid(1), Some(2)).unwrap();
        cart.add(&catalog, &ledger, pid(2), Some(3)).unwrap();

        cart.reorder(&[pid(2), pid(0), pid(1)]).unwrap();
        let order: Vec<_> = cart.lines().iter().map(|l| (l.product_id.as_u32(), l.quantity)).collect();
        assert_eq!(order, vec![(2, 3), (0, 1), (1, 2)]);
    }

    #[test]
    fn test_reorder_rejects_mismatched_sets() {
        let (catalog, ledger) = fixtures(10);
        let mut cart = Cart::default();
        cart.add(&catalog, &ledger, pid(0), Some(1)).unwrap();
        cart.add(&catalog, &ledger, pid(1), Some(1)).unwrap();
        let before = cart.clone();

        for order in [
            vec![pid(0)],
            vec![pid(0), pid(0)],
            vec![pid(0), pid(2)],
            vec![pid(0), pid(1), pid(2)],
        ] {
            assert_eq!(cart.reorder(&order).unwrap_err(), ShopError::InvalidProductId);
            assert_eq!(cart, before);
        }
    }
}
