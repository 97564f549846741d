//! Cart aggregate
//!
//! One cart per customer session. All lines share one restaurant; adding a
//! dish from another restaurant is rejected until the cart is cleared.
//!
//! The aggregate is a plain value: [`crate::storage::BookingStorage::update_cart`]
//! loads it, applies one operation and saves it inside a single write
//! transaction.

pub mod money;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{CartItemInput, CartLine};

use crate::core::error::{BookingError, BookingResult};

/// In-progress line items for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Checkout idempotency key, regenerated each time the cart becomes empty
    pub cart_id: String,
    pub session_id: String,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            cart_id: new_cart_id(),
            session_id: session_id.into(),
            lines: Vec::new(),
        }
    }

    /// Restaurant shared by all lines, `None` while empty
    pub fn restaurant_id(&self) -> Option<&str> {
        self.lines.first().map(|l| l.restaurant_id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, dish_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.dish_id == dish_id)
    }

    /// Add one unit of a dish
    ///
    /// A new line captures the dish price; an existing line is incremented
    /// and keeps its original price.
    pub fn add_item(&mut self, item: &CartItemInput) -> BookingResult<&CartLine> {
        if let Some(current) = self.restaurant_id()
            && current != item.restaurant_id
        {
            return Err(BookingError::ConflictingRestaurant {
                current: current.to_string(),
                requested: item.restaurant_id.clone(),
            });
        }

        let idx = match self.lines.iter().position(|l| l.dish_id == item.dish_id) {
            Some(idx) => {
                let quantity = self.lines[idx].quantity + 1;
                money::validate_quantity(quantity)?;
                self.lines[idx].quantity = quantity;
                idx
            }
            None => {
                money::validate_price(item.unit_price)?;
                self.lines.push(CartLine {
                    dish_id: item.dish_id.clone(),
                    dish_name: item.dish_name.clone(),
                    quantity: 1,
                    unit_price: item.unit_price,
                    restaurant_id: item.restaurant_id.clone(),
                });
                self.lines.len() - 1
            }
        };

        Ok(&self.lines[idx])
    }

    /// Delete a line; no-op if absent
    pub fn remove_item(&mut self, dish_id: &str) {
        let before = self.lines.len();
        self.lines.retain(|l| l.dish_id != dish_id);
        if before > 0 && self.lines.is_empty() {
            self.cart_id = new_cart_id();
        }
    }

    /// Overwrite a line's quantity; `quantity <= 0` removes the line
    ///
    /// Setting the quantity of a dish not in the cart is a no-op.
    pub fn set_quantity(&mut self, dish_id: &str, quantity: i32) -> BookingResult<()> {
        if quantity <= 0 {
            self.remove_item(dish_id);
            return Ok(());
        }
        money::validate_quantity(quantity)?;
        if let Some(line) = self.lines.iter_mut().find(|l| l.dish_id == dish_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Empty all lines
    pub fn clear(&mut self) {
        self.lines.clear();
        self.cart_id = new_cart_id();
    }

    /// Σ quantity
    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity as i64).sum()
    }

    /// Σ quantity × unit price
    pub fn total_price(&self) -> Decimal {
        money::sum_lines(self.lines.iter().map(|l| (l.quantity, &l.unit_price)))
    }

    pub fn view(&self) -> CartView {
        CartView {
            cart_id: self.cart_id.clone(),
            restaurant_id: self.restaurant_id().map(str::to_string),
            lines: self.lines.clone(),
            total_items: self.total_items(),
            total_price: self.total_price(),
        }
    }
}

/// Cart as returned by the API, totals included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: String,
    pub restaurant_id: Option<String>,
    pub lines: Vec<CartLine>,
    pub total_items: i64,
    pub total_price: Decimal,
}

fn new_cart_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ValidationError;
    use std::str::FromStr;

    fn dish(id: &str, price: &str, restaurant: &str) -> CartItemInput {
        CartItemInput {
            dish_id: id.to_string(),
            dish_name: format!("Dish {}", id),
            unit_price: Decimal::from_str(price).unwrap(),
            restaurant_id: restaurant.to_string(),
        }
    }

    #[test]
    fn test_add_item_increments_existing_line() {
        let mut cart = Cart::new("s-1");
        cart.add_item(&dish("a", "300", "r")).unwrap();
        let line = cart.add_item(&dish("a", "300", "r")).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.restaurant_id(), Some("r"));
    }

    #[test]
    fn test_add_item_keeps_captured_price() {
        let mut cart = Cart::new("s-1");
        cart.add_item(&dish("a", "300", "r")).unwrap();
        // catalog price changed in between
        cart.add_item(&dish("a", "350", "r")).unwrap();
        assert_eq!(cart.total_price(), Decimal::from(600));
    }

    #[test]
    fn test_add_item_other_restaurant_rejected() {
        let mut cart = Cart::new("s-1");
        cart.add_item(&dish("a", "300", "r1")).unwrap();
        let err = cart.add_item(&dish("b", "100", "r2")).unwrap_err();
        assert!(matches!(
            err,
            BookingError::ConflictingRestaurant { ref current, ref requested }
                if current == "r1" && requested == "r2"
        ));
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_add_item_invalid_price_rejected() {
        let mut cart = Cart::new("s-1");
        let err = cart.add_item(&dish("a", "9.999", "r")).unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::InvalidPrice(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new("s-1");
        cart.add_item(&dish("a", "300", "r")).unwrap();
        cart.add_item(&dish("b", "150", "r")).unwrap();
        cart.set_quantity("a", 0).unwrap();
        assert!(cart.line("a").is_none());
        assert_eq!(cart.total_items(), 1);

        cart.set_quantity("b", 4).unwrap();
        assert_eq!(cart.line("b").unwrap().quantity, 4);
        assert!(cart.set_quantity("b", 1000).is_err());
        assert_eq!(cart.line("b").unwrap().quantity, 4);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = Cart::new("s-1");
        let cart_id = cart.cart_id.clone();
        cart.remove_item("ghost");
        assert_eq!(cart.cart_id, cart_id);
    }

    #[test]
    fn test_emptying_renews_cart_id() {
        let mut cart = Cart::new("s-1");
        cart.add_item(&dish("a", "300", "r")).unwrap();
        let first = cart.cart_id.clone();
        cart.remove_item("a");
        assert_ne!(cart.cart_id, first);

        cart.add_item(&dish("b", "10", "other")).unwrap();
        let second = cart.cart_id.clone();
        cart.clear();
        assert_ne!(cart.cart_id, second);
        assert_eq!(cart.restaurant_id(), None);
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new("s-1");
        cart.add_item(&dish("a", "300", "r")).unwrap();
        cart.add_item(&dish("a", "300", "r")).unwrap();
        cart.add_item(&dish("b", "150", "r")).unwrap();
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), Decimal::from(750));

        let view = cart.view();
        assert_eq!(view.total_price, Decimal::from(750));
        assert_eq!(view.restaurant_id.as_deref(), Some("r"));
    }
}
