//! Effective unit price per portion variant.
//!
//! Unit-type products only sell whole units, so a half request is rejected
//! with a validation error. Ration-type products without a half price fall
//! back to the full price.

use tracing::debug;

use crate::error::{PosError, PosResult};
use crate::models::{PortionType, Product, Variant};

pub fn supports_half(product: &Product) -> bool {
    product.portion_type == PortionType::Ration
}

pub fn effective_unit_price(product: &Product, variant: Variant) -> PosResult<f64> {
    match variant {
        Variant::Full => Ok(product.price),
        Variant::Half if !supports_half(product) => Err(PosError::validation(format!(
            "{} is sold by unit and has no half portion",
            product.name
        ))),
        Variant::Half => match product.half_price {
            Some(half) => Ok(half),
            None => {
                debug!(product_id = %product.id, "no half price set, charging full price");
                Ok(product.price)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paella(half_price: Option<f64>) -> Product {
        Product {
            id: "paella".into(),
            name: "Paella".into(),
            price: 12.0,
            category: "arroces".into(),
            portion_type: PortionType::Ration,
            half_price,
            display_order: None,
            image: None,
            description: None,
        }
    }

    #[test]
    fn test_full_variant_uses_base_price() {
        assert_eq!(effective_unit_price(&paella(Some(7.0)), Variant::Full).unwrap(), 12.0);
    }

    #[test]
    fn test_half_variant_uses_half_price() {
        assert_eq!(effective_unit_price(&paella(Some(7.0)), Variant::Half).unwrap(), 7.0);
    }

    #[test]
    fn test_half_variant_without_half_price_falls_back_to_full() {
        assert_eq!(effective_unit_price(&paella(None), Variant::Half).unwrap(), 12.0);
    }

    #[test]
    fn test_half_variant_on_unit_product_is_rejected() {
        let mut beer = paella(Some(1.0));
        beer.portion_type = PortionType::Unit;
        let err = effective_unit_price(&beer, Variant::Half).unwrap_err();
        assert!(err.is_validation());
        assert!(!supports_half(&beer));
    }
}
