use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::info;
use uuid::Uuid;

use crate::db::{load_list, save_list, KeyValueStore};
use crate::error::{PosError, PosResult};
use crate::models::{ConfirmedOrder, OrderLineItem, OrderStatus, PaymentMethod};
use crate::money;

pub const ORDERS_KEY: &str = "confirmed_orders";

/// Reload order history from the store, newest first.
pub fn get_orders<S: KeyValueStore>(store: &S) -> PosResult<Vec<ConfirmedOrder>> {
    load_list(store, ORDERS_KEY)
}

pub fn get_order<S: KeyValueStore>(store: &S, id: &str) -> PosResult<ConfirmedOrder> {
    get_orders(store)?
        .into_iter()
        .find(|o| o.id == id)
        .ok_or_else(|| PosError::order_not_found(id))
}

/// `max(order_number) + 1`, or 1 for an empty history. Numbers freed by
/// deletions are never handed out again while a higher one exists.
pub fn next_order_number(orders: &[ConfirmedOrder]) -> u32 {
    orders
        .iter()
        .map(|o| o.order_number)
        .max()
        .map_or(1, |max| max + 1)
}

fn validate_items(items: &[OrderLineItem]) -> PosResult<()> {
    if items.is_empty() {
        return Err(PosError::validation("an order must contain at least one item"));
    }
    items.iter().try_for_each(money::validate_line)
}

/// Confirm a cart. `items` is taken as given, including any manual price
/// adjustments made after the lines were added.
pub fn finalize<S: KeyValueStore>(
    store: &S,
    items: Vec<OrderLineItem>,
    payment_method: Option<PaymentMethod>,
    tz: Tz,
) -> PosResult<ConfirmedOrder> {
    finalize_at(store, items, payment_method, tz, Utc::now())
}

pub fn finalize_at<S: KeyValueStore>(
    store: &S,
    items: Vec<OrderLineItem>,
    payment_method: Option<PaymentMethod>,
    tz: Tz,
    now: DateTime<Utc>,
) -> PosResult<ConfirmedOrder> {
    validate_items(&items)?;

    let mut orders = get_orders(store)?;

    let order = ConfirmedOrder {
        id: Uuid::new_v4().to_string(),
        order_number: next_order_number(&orders),
        total: money::items_total(&items),
        items,
        date: now.with_timezone(&tz).fixed_offset(),
        status: OrderStatus::Completed,
        payment_method,
    };

    orders.insert(0, order.clone());
    save_list(store, ORDERS_KEY, &orders)?;

    info!(
        order_id = %order.id,
        order_number = order.order_number,
        total = order.total,
        lines = order.items.len(),
        "order confirmed"
    );

    Ok(order)
}

/// Replace the items of a confirmed order and recompute its total. The
/// status is left as is.
pub fn edit_items<S: KeyValueStore>(
    store: &S,
    order_id: &str,
    items: Vec<OrderLineItem>,
) -> PosResult<ConfirmedOrder> {
    validate_items(&items)?;

    let mut orders = get_orders(store)?;
    let order = orders
        .iter_mut()
        .find(|o| o.id == order_id)
        .ok_or_else(|| PosError::order_not_found(order_id))?;

    order.total = money::items_total(&items);
    order.items = items;
    let updated = order.clone();

    save_list(store, ORDERS_KEY, &orders)?;
    info!(order_id = %order_id, total = updated.total, "order items edited");

    Ok(updated)
}

pub fn set_status<S: KeyValueStore>(
    store: &S,
    order_id: &str,
    status: OrderStatus,
) -> PosResult<ConfirmedOrder> {
    let mut orders = get_orders(store)?;
    let order = orders
        .iter_mut()
        .find(|o| o.id == order_id)
        .ok_or_else(|| PosError::order_not_found(order_id))?;

    order.status = status;
    let updated = order.clone();

    save_list(store, ORDERS_KEY, &orders)?;
    info!(order_id = %order_id, status = status.as_str(), "order status changed");

    Ok(updated)
}

pub fn set_payment_method<S: KeyValueStore>(
    store: &S,
    order_id: &str,
    payment_method: Option<PaymentMethod>,
) -> PosResult<ConfirmedOrder> {
    let mut orders = get_orders(store)?;
    let order = orders
        .iter_mut()
        .find(|o| o.id == order_id)
        .ok_or_else(|| PosError::order_not_found(order_id))?;

    order.payment_method = payment_method;
    let updated = order.clone();

    save_list(store, ORDERS_KEY, &orders)?;
    Ok(updated)
}

/// Irreversible.
pub fn remove<S: KeyValueStore>(store: &S, order_id: &str) -> PosResult<()> {
    let mut orders = get_orders(store)?;
    let before = orders.len();
    orders.retain(|o| o.id != order_id);

    if orders.len() == before {
        return Err(PosError::order_not_found(order_id));
    }

    save_list(store, ORDERS_KEY, &orders)?;
    info!(order_id = %order_id, "order deleted");
    Ok(())
}
