//! Cart line items and derived cart math.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A single line in a shopping cart.
///
/// Lines are unique by `product_id` within a cart. The wire format uses the
/// RetailCloud field names (`productId`, `name`, `price`, `qty`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Display name of the product.
    #[serde(default)]
    pub name: String,
    /// Price per unit.
    #[serde(rename = "price", default)]
    pub unit_price: Decimal,
    /// Number of units.
    #[serde(rename = "qty", default)]
    pub quantity: u32,
}

impl CartLine {
    /// Create a new cart line.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Total for this line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Total amount of a cart: `sum(unit_price * quantity)` over all lines.
///
/// Always derived, never stored.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Total number of units in a cart: `sum(quantity)` over all lines.
#[must_use]
pub fn cart_item_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}
