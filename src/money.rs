//! Money arithmetic using rust_decimal.
//!
//! Prices are stored as `f64`; every sum goes through `Decimal` and is
//! rounded back to two places.

use rust_decimal::prelude::*;

use crate::error::{PosError, PosResult};
use crate::models::OrderLineItem;

const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: u32 = 9999;

#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

pub fn line_total(item: &OrderLineItem) -> Decimal {
    to_decimal(item.price) * Decimal::from(item.quantity)
}

/// Σ price × quantity over the lines.
pub fn items_total(items: &[OrderLineItem]) -> f64 {
    to_f64(items.iter().map(line_total).sum())
}

pub fn validate_price(price: f64, field: &str) -> PosResult<()> {
    if !price.is_finite() {
        return Err(PosError::validation(format!(
            "{field} must be a finite number, got {price}"
        )));
    }
    if price < 0.0 {
        return Err(PosError::validation(format!(
            "{field} must be non-negative, got {price}"
        )));
    }
    if price > MAX_PRICE {
        return Err(PosError::validation(format!(
            "{field} exceeds maximum allowed ({MAX_PRICE}), got {price}"
        )));
    }
    Ok(())
}

/// Checks a line before it is written into an order.
pub fn validate_line(item: &OrderLineItem) -> PosResult<()> {
    validate_price(item.price, "price")?;
    validate_quantity(i64::from(item.quantity), &item.product_id)
}

pub fn validate_quantity(quantity: i64, product_id: &str) -> PosResult<()> {
    if quantity < 1 {
        return Err(PosError::validation(format!(
            "quantity for {product_id} must be at least 1"
        )));
    }
    if quantity > i64::from(MAX_QUANTITY) {
        return Err(PosError::validation(format!(
            "quantity for {product_id} exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Variant;

    fn line(price: f64, quantity: u32) -> OrderLineItem {
        OrderLineItem {
            product_id: "p".into(),
            name: "P".into(),
            price,
            image: None,
            category: "c".into(),
            quantity,
            variant: Variant::Full,
        }
    }

    #[test]
    fn test_items_total_avoids_float_drift() {
        let items = vec![line(0.1, 3), line(0.2, 1)];
        assert_eq!(items_total(&items), 0.5);
    }

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(items_total(&[]), 0.0);
    }

    #[test]
    fn test_validate_price_rejects_negative_and_nan() {
        assert!(validate_price(-1.0, "price").unwrap_err().is_validation());
        assert!(validate_price(f64::NAN, "price").is_err());
        assert!(validate_price(0.0, "price").is_ok());
    }

    #[test]
    fn test_validate_line_rejects_zero_quantity() {
        assert!(validate_line(&line(5.0, 0)).unwrap_err().is_validation());
    }

    #[test]
    fn test_validate_line_rejects_quantity_over_max() {
        assert!(validate_line(&line(5.0, MAX_QUANTITY)).is_ok());
        assert!(validate_line(&line(5.0, MAX_QUANTITY + 1))
            .unwrap_err()
            .is_validation());
        assert!(validate_line(&line(5.0, u32::MAX)).is_err());
    }
}
