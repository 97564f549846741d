//! Cart line and cart request payloads

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One dish in a session cart
///
/// `unit_price` is captured when the dish is first added and never changes
/// for the lifetime of the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub dish_id: String,
    pub dish_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub restaurant_id: String,
}

impl CartLine {
    /// quantity × unit price
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Dish data supplied by the catalog with an add-to-cart request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemInput {
    pub dish_id: String,
    pub dish_name: String,
    pub unit_price: Decimal,
    pub restaurant_id: String,
}

/// Set-quantity payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartQuantityUpdate {
    pub quantity: i32,
}
