use tracing::info;

use crate::db::{load_list, save_list, KeyValueStore};
use crate::error::{PosError, PosResult};
use crate::models::{PortionType, Product};
use crate::money;

pub const PRODUCTS_KEY: &str = "menu_products";

/// Display order used for products that were never positioned.
pub const UNORDERED_SENTINEL: i32 = 999;

/// Stable sort by display order; unpositioned products go last.
pub fn sort_by_display_order(products: &mut [Product]) {
    products.sort_by_key(|p| p.display_order.unwrap_or(UNORDERED_SENTINEL));
}

/// Full catalog in display order.
pub fn get_products<S: KeyValueStore>(store: &S) -> PosResult<Vec<Product>> {
    let mut products: Vec<Product> = load_list(store, PRODUCTS_KEY)?;
    sort_by_display_order(&mut products);
    Ok(products)
}

pub fn get_products_in_category<S: KeyValueStore>(
    store: &S,
    category: &str,
) -> PosResult<Vec<Product>> {
    let mut products = get_products(store)?;
    products.retain(|p| p.category == category);
    Ok(products)
}

pub fn get_product<S: KeyValueStore>(store: &S, id: &str) -> PosResult<Product> {
    load_list::<Product, _>(store, PRODUCTS_KEY)?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| PosError::product_not_found(id))
}

fn validate_product(product: &Product) -> PosResult<()> {
    if product.id.trim().is_empty() {
        return Err(PosError::validation("product id must not be empty"));
    }
    if product.name.trim().is_empty() {
        return Err(PosError::validation("product name must not be empty"));
    }
    money::validate_price(product.price, "price")?;
    if let Some(half) = product.half_price {
        money::validate_price(half, "half_price")?;
    }
    Ok(())
}

/// Insert or replace by id. Half prices only make sense on ration products,
/// so they are dropped from unit products.
pub fn save_product<S: KeyValueStore>(store: &S, mut product: Product) -> PosResult<Product> {
    validate_product(&product)?;
    if product.portion_type == PortionType::Unit {
        product.half_price = None;
    }

    let mut products: Vec<Product> = load_list(store, PRODUCTS_KEY)?;
    match products.iter_mut().find(|p| p.id == product.id) {
        Some(existing) => *existing = product.clone(),
        None => products.push(product.clone()),
    }

    save_list(store, PRODUCTS_KEY, &products)?;
    Ok(product)
}

pub fn delete_product<S: KeyValueStore>(store: &S, id: &str) -> PosResult<()> {
    let mut products: Vec<Product> = load_list(store, PRODUCTS_KEY)?;
    let before = products.len();
    products.retain(|p| p.id != id);

    if products.len() == before {
        return Err(PosError::product_not_found(id));
    }

    save_list(store, PRODUCTS_KEY, &products)?;
    info!(product_id = %id, "product deleted");
    Ok(())
}

/// Assign `display_order = index` to each id in `ordered_ids` and persist the
/// whole catalog. Ids may be a filtered view; other products keep their
/// position value.
pub fn reorder_products<S: KeyValueStore>(
    store: &S,
    ordered_ids: &[String],
) -> PosResult<Vec<Product>> {
    let mut products: Vec<Product> = load_list(store, PRODUCTS_KEY)?;

    if let Some(missing) = ordered_ids
        .iter()
        .find(|id| !products.iter().any(|p| &p.id == *id))
    {
        return Err(PosError::product_not_found(missing.as_str()));
    }

    for (index, id) in ordered_ids.iter().enumerate() {
        if let Some(product) = products.iter_mut().find(|p| &p.id == id) {
            product.display_order = Some(index as i32);
        }
    }

    save_list(store, PRODUCTS_KEY, &products)?;
    info!(count = ordered_ids.len(), "products reordered");

    sort_by_display_order(&mut products);
    Ok(products)
}

/// Drag-and-drop move inside a view, then resequence that view.
pub fn move_product<S: KeyValueStore>(
    store: &S,
    view_ids: &[String],
    from: usize,
    to: usize,
) -> PosResult<Vec<Product>> {
    if from >= view_ids.len() || to >= view_ids.len() {
        return Err(PosError::validation(format!(
            "move {from} -> {to} is outside a view of {} products",
            view_ids.len()
        )));
    }

    let mut ids = view_ids.to_vec();
    let moved = ids.remove(from);
    ids.insert(to, moved);

    reorder_products(store, &ids)
}
