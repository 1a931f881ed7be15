//! Catalog store.
//!
//! Products are read on every request and only change through admin create
//! and delete, so the store sits behind a read-write lock keyed by id.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};
use crate::types::{ProductId, round2};

/// Image reference reported for every product to `problem` identities.
pub const BROKEN_IMAGE_REF: &str = "/static/img/broken-image.jpg";

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_ref: String,
}

/// Admin input for creating a product. The id is assigned by the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_ref: String,
}

/// Catalog listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Creation (id) order.
    #[default]
    None,
    /// Name ascending.
    Az,
    /// Name descending.
    Za,
    /// Price ascending.
    Lohi,
    /// Price descending.
    Hilo,
}

impl std::str::FromStr for SortMode {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "az" => Ok(Self::Az),
            "za" => Ok(Self::Za),
            "lohi" => Ok(Self::Lohi),
            "hilo" => Ok(Self::Hilo),
            other => Err(ShopError::InvalidInput(format!("unknown sort mode: {other}"))),
        }
    }
}

/// Read access to products by id.
///
/// Pricing resolves cart lines through this trait so it can run against the
/// live store or a fixed set of products.
pub trait ProductLookup {
    /// Look up a product by id.
    fn product(&self, id: ProductId) -> Option<Product>;
}

/// The product catalog.
#[derive(Debug)]
pub struct CatalogStore {
    products: RwLock<BTreeMap<ProductId, Product>>,
    next_id: AtomicU32,
}

impl CatalogStore {
    /// Create a store holding the given products.
    #[must_use]
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let products: BTreeMap<_, _> = products.into_iter().map(|p| (p.id, p)).collect();
        let next_id = products
            .keys()
            .next_back()
            .map_or(0, |id| id.as_u32().saturating_add(1));

        Self {
            products: RwLock::new(products),
            next_id: AtomicU32::new(next_id),
        }
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.read().get(&id).cloned()
    }

    /// Whether a product with this id exists.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.read().contains_key(&id)
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// All products in the requested order.
    ///
    /// Ties are broken by id so listings are stable.
    #[must_use]
    pub fn sorted(&self, mode: SortMode) -> Vec<Product> {
        let mut products: Vec<Product> = self.read().values().cloned().collect();
        match mode {
            SortMode::None => {}
            SortMode::Az => products.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then(a.id.cmp(&b.id))
            }),
            SortMode::Za => products.sort_by(|a, b| {
                b.name
                    .to_lowercase()
                    .cmp(&a.name.to_lowercase())
                    .then(a.id.cmp(&b.id))
            }),
            SortMode::Lohi => products.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
            SortMode::Hilo => products.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
        }
        products
    }

    /// Validate and insert a new product, assigning the next id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidInput` for a blank name or a negative price.
    pub fn insert(&self, new: NewProduct) -> Result<Product> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ShopError::InvalidInput("product name is required".into()));
        }
        if new.price.is_sign_negative() {
            return Err(ShopError::InvalidInput(
                "product price cannot be negative".into(),
            ));
        }

        let id = ProductId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let product = Product {
            id,
            name: name.to_owned(),
            description: new.description.trim().to_owned(),
            price: round2(new.price),
            image_ref: new.image_ref.trim().to_owned(),
        };

        self.write().insert(id, product.clone());
        Ok(product)
    }

    /// Remove a product, returning it if it existed.
    pub fn remove(&self, id: ProductId) -> Option<Product> {
        self.write().remove(&id)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<ProductId, Product>> {
        self.products.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<ProductId, Product>> {
        self.products.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProductLookup for CatalogStore {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.get(id)
    }
}

impl ProductLookup for [Product] {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.iter().find(|p| p.id == id).cloned()
    }
}
