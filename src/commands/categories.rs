use tracing::info;

use crate::db::{save_list, KeyValueStore};
use crate::error::{PosError, PosResult};
use crate::models::Category;

pub const CATEGORIES_KEY: &str = "menu_categories";

fn default_categories() -> Vec<Category> {
    [
        ("arroces", "Arroces y Paellas"),
        ("entrantes", "Entrantes"),
        ("principales", "Platos Principales"),
        ("bebidas", "Bebidas"),
        ("postres", "Postres"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (id, name))| Category {
        id: id.to_string(),
        name: name.to_string(),
        display_order: i as i32 + 1,
    })
    .collect()
}

/// Categories sorted by display order. Seeds the default set on first use.
pub fn get_categories<S: KeyValueStore>(store: &S) -> PosResult<Vec<Category>> {
    let mut categories: Vec<Category> = match store.get(CATEGORIES_KEY)? {
        Some(value) => serde_json::from_value(value)?,
        None => {
            let defaults = default_categories();
            save_list(store, CATEGORIES_KEY, &defaults)?;
            info!(count = defaults.len(), "seeded default categories");
            defaults
        }
    };

    categories.sort_by_key(|c| c.display_order);
    Ok(categories)
}

/// Insert or replace by id.
pub fn save_category<S: KeyValueStore>(store: &S, category: Category) -> PosResult<Category> {
    if category.id.trim().is_empty() {
        return Err(PosError::validation("category id must not be empty"));
    }
    if category.name.trim().is_empty() {
        return Err(PosError::validation("category name must not be empty"));
    }

    let mut categories = get_categories(store)?;

    match categories.iter_mut().find(|c| c.id == category.id) {
        Some(existing) => *existing = category.clone(),
        None => categories.push(category.clone()),
    }

    save_list(store, CATEGORIES_KEY, &categories)?;
    Ok(category)
}

pub fn delete_category<S: KeyValueStore>(store: &S, id: &str) -> PosResult<()> {
    let mut categories = get_categories(store)?;
    let before = categories.len();
    categories.retain(|c| c.id != id);

    if categories.len() == before {
        return Err(PosError::category_not_found(id));
    }

    save_list(store, CATEGORIES_KEY, &categories)?;
    info!(category_id = %id, "category deleted");
    Ok(())
}
