//! Money validation using rust_decimal
//!
//! Prices arrive from the catalog with each add-to-cart request and are
//! checked once, when the line is created.

use rust_decimal::Decimal;

use crate::core::error::ValidationError;

/// Currency minor unit (2 decimal places)
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per dish (1,000,000)
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Maximum quantity on one cart line
pub const MAX_QUANTITY: i32 = 999;

/// Validate a dish price before it is captured on a cart line
pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::InvalidPrice(format!(
            "price must be non-negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(ValidationError::InvalidPrice(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    if price.normalize().scale() > DECIMAL_PLACES {
        return Err(ValidationError::InvalidPrice(format!(
            "price has more than {} decimal places: {}",
            DECIMAL_PLACES, price
        )));
    }
    Ok(())
}

/// Validate a line quantity (must be positive and within the cap)
pub fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(ValidationError::Quantity {
            quantity,
            max: MAX_QUANTITY,
        });
    }
    Ok(())
}

/// Σ quantity × unit price
pub fn sum_lines<'a>(lines: impl IntoIterator<Item = (i32, &'a Decimal)>) -> Decimal {
    lines
        .into_iter()
        .map(|(quantity, price)| *price * Decimal::from(quantity))
        .sum()
}
