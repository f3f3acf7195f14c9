use serde::{Deserialize, Serialize};

use crate::error::{PosError, PosResult};
use crate::models::{OrderLineItem, Product, Variant};
use crate::money;
use crate::pricing;

/// In-progress order for the active session.
///
/// Holds at most one line per `(product_id, variant)`. Lines keep the price
/// captured when first added, so catalog edits made in the meantime do not
/// move a running ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    items: Vec<OrderLineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, product_id: &str, variant: Variant) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.key() == (product_id, variant))
    }

    /// Add one portion of `product`. Fails once the line is at
    /// [`money::MAX_QUANTITY`].
    pub fn add_item(&mut self, product: &Product, variant: Variant) -> PosResult<()> {
        if let Some(idx) = self.position(&product.id, variant) {
            let line = &mut self.items[idx];
            let quantity = line.quantity.saturating_add(1);
            money::validate_quantity(i64::from(quantity), &line.product_id)?;
            line.quantity = quantity;
            return Ok(());
        }

        let price = pricing::effective_unit_price(product, variant)?;
        self.items.push(OrderLineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price,
            image: product.image.clone(),
            category: product.category.clone(),
            quantity: 1,
            variant,
        });
        Ok(())
    }

    /// Quantity <= 0 removes the line. Above [`money::MAX_QUANTITY`] the
    /// line is left as is and a validation error is returned.
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        variant: Variant,
        quantity: i64,
    ) -> PosResult<()> {
        let Some(idx) = self.position(product_id, variant) else {
            return Ok(());
        };
        if quantity <= 0 {
            self.items.remove(idx);
            return Ok(());
        }

        money::validate_quantity(quantity, product_id)?;
        self.items[idx].quantity = u32::try_from(quantity)
            .map_err(|_| PosError::validation(format!("quantity out of range: {quantity}")))?;
        Ok(())
    }

    /// Manual price override before confirmation (e.g. a discount).
    pub fn set_price(&mut self, product_id: &str, variant: Variant, price: f64) {
        if let Some(idx) = self.position(product_id, variant) {
            self.items[idx].price = if price.is_finite() { price.max(0.0) } else { 0.0 };
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[OrderLineItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<OrderLineItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn total(&self) -> f64 {
        money::items_total(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PortionType;
    use std::collections::HashSet;

    fn product(id: &str, price: f64, portion_type: PortionType, half_price: Option<f64>) -> Product {
        Product {
            id: id.into(),
            name: id.to_uppercase(),
            price,
            category: "arroces".into(),
            portion_type,
            half_price,
            display_order: None,
            image: None,
            description: None,
        }
    }

    fn assert_unique_keys(cart: &Cart) {
        let keys: HashSet<_> = cart.items().iter().map(|i| i.key()).collect();
        assert_eq!(keys.len(), cart.items().len());
        assert!(cart.items().iter().all(|i| i.quantity >= 1));
    }

    #[test]
    fn test_add_same_item_increments() {
        let paella = product("paella", 12.0, PortionType::Ration, Some(7.0));
        let mut cart = Cart::new();
        cart.add_item(&paella, Variant::Full).unwrap();
        cart.add_item(&paella, Variant::Full).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_variants_never_merge() {
        let paella = product("paella", 12.0, PortionType::Ration, Some(7.0));
        let mut cart = Cart::new();
        cart.add_item(&paella, Variant::Full).unwrap();
        cart.add_item(&paella, Variant::Half).unwrap();
        cart.add_item(&paella, Variant::Half).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total(), 26.0);
        assert_eq!(cart.item_count(), 3);
        assert_unique_keys(&cart);
    }

    #[test]
    fn test_half_without_half_price_charges_full() {
        let fideua = product("fideua", 11.5, PortionType::Ration, None);
        let mut cart = Cart::new();
        cart.add_item(&fideua, Variant::Half).unwrap();
        assert_eq!(cart.items()[0].price, 11.5);
    }

    #[test]
    fn test_half_unit_product_leaves_cart_untouched() {
        let water = product("water", 2.0, PortionType::Unit, None);
        let mut cart = Cart::new();
        assert!(cart.add_item(&water, Variant::Half).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let paella = product("paella", 12.0, PortionType::Ration, Some(7.0));
        let mut cart = Cart::new();
        cart.add_item(&paella, Variant::Full).unwrap();
        cart.add_item(&paella, Variant::Half).unwrap();

        cart.set_quantity("paella", Variant::Half, 0).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].variant, Variant::Full);

        cart.set_quantity("paella", Variant::Full, -3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_keeps_captured_price() {
        let mut paella = product("paella", 12.0, PortionType::Ration, Some(7.0));
        let mut cart = Cart::new();
        cart.add_item(&paella, Variant::Full).unwrap();

        paella.price = 15.0;
        cart.set_quantity("paella", Variant::Full, 4).unwrap();
        cart.add_item(&paella, Variant::Full).unwrap();

        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.items()[0].price, 12.0);
        assert_eq!(cart.total(), 60.0);
    }

    #[test]
    fn test_quantity_is_capped() {
        let paella = product("paella", 12.0, PortionType::Ration, Some(7.0));
        let mut cart = Cart::new();
        cart.add_item(&paella, Variant::Full).unwrap();

        let err = cart
            .set_quantity("paella", Variant::Full, 5_000_000_000)
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(cart.items()[0].quantity, 1);

        cart.set_quantity("paella", Variant::Full, i64::from(money::MAX_QUANTITY))
            .unwrap();
        assert!(cart.add_item(&paella, Variant::Full).unwrap_err().is_validation());
        assert_eq!(cart.items()[0].quantity, money::MAX_QUANTITY);
        assert_unique_keys(&cart);
    }

    #[test]
    fn test_set_quantity_unknown_line_is_noop() {
        let mut cart = Cart::new();
        cart.set_quantity("ghost", Variant::Full, 3).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_price_clamps_negative() {
        let paella = product("paella", 12.0, PortionType::Ration, Some(7.0));
        let mut cart = Cart::new();
        cart.add_item(&paella, Variant::Full).unwrap();
        cart.set_price("paella", Variant::Full, -4.0);
        assert_eq!(cart.total(), 0.0);
        cart.set_price("paella", Variant::Full, 10.0);
        assert_eq!(cart.total(), 10.0);
    }

    #[test]
    fn test_mixed_operation_sequence_keeps_keys_unique() {
        let paella = product("paella", 12.0, PortionType::Ration, Some(7.0));
        let bravas = product("bravas", 5.5, PortionType::Ration, None);
        let cana = product("cana", 2.0, PortionType::Unit, None);
        let mut cart = Cart::new();

        for step in 0..40i64 {
            let (p, v) = match step % 5 {
                0 => (&paella, Variant::Full),
                1 => (&paella, Variant::Half),
                2 => (&bravas, Variant::Half),
                3 => (&cana, Variant::Full),
                _ => (&bravas, Variant::Full),
            };
            cart.add_item(p, v).unwrap();
            if step % 7 == 0 {
                cart.set_quantity(&p.id, v, step % 3 - 1).unwrap();
            }
            assert_unique_keys(&cart);
        }

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0.0);
    }
}
