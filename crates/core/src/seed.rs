//! Startup data: the demo catalog, its stock, and the coupon codes.

use rust_decimal::Decimal;

use crate::catalog::Product;
use crate::types::ProductId;

/// Initial contents of a shop.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    /// Products with their starting stock.
    pub products: Vec<(Product, u32)>,
    /// Coupon codes with their discount fractions.
    pub coupons: Vec<(String, Decimal)>,
}

/// Starting stock for every demo product.
pub const DEMO_STOCK: u32 = 25;

fn demo_product(id: u32, name: &str, cents: i64, image: &str, description: &str) -> (Product, u32) {
    let product = Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
        price: Decimal::new(cents, 2),
        image_ref: format!("/static/img/{image}.jpg"),
    };
    (product, DEMO_STOCK)
}

impl Seed {
    /// The catalog test suites run against by default.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            products: vec![
                demo_product(
                    0,
                    "Bike Light",
                    999,
                    "bike-light",
                    "Rechargeable front light with three brightness modes.",
                ),
                demo_product(
                    1,
                    "Canvas Backpack",
                    2999,
                    "canvas-backpack",
                    "Water-resistant daypack with a padded laptop sleeve.",
                ),
                demo_product(
                    2,
                    "Cotton T-Shirt",
                    1599,
                    "cotton-tshirt",
                    "Heavyweight crew neck in washed black.",
                ),
                demo_product(
                    3,
                    "Fleece Jacket",
                    4999,
                    "fleece-jacket",
                    "Midweight fleece with zip hand pockets.",
                ),
                demo_product(
                    4,
                    "Baby Onesie",
                    799,
                    "baby-onesie",
                    "Snap-front onesie in organic cotton.",
                ),
                demo_product(
                    5,
                    "Red Hoodie",
                    3999,
                    "red-hoodie",
                    "Brushed-back pullover hoodie.",
                ),
            ],
            coupons: vec![
                ("SAVE10".to_owned(), Decimal::new(10, 2)),
                ("SAVE20".to_owned(), Decimal::new(20, 2)),
                ("HALFOFF".to_owned(), Decimal::new(50, 2)),
                ("FREESTUFF".to_owned(), Decimal::ONE),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_ids_are_dense() {
        let seed = Seed::demo();
        for (index, (product, stock)) in seed.products.iter().enumerate() {
            assert_eq!(product.id.as_u32() as usize, index);
            assert_eq!(*stock, DEMO_STOCK);
        }
    }

    #[test]
    fn test_bike_light_price() {
        let seed = Seed::demo();
        let (bike_light, _) = &seed.products[0];
        assert_eq!(bike_light.price, Decimal::new(999, 2));
    }
}
