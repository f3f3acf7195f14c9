use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{ConfirmedOrder, DaySummary, ProductSales};
use crate::money;

/// Calendar day of an order in the reporting timezone.
pub fn order_day(order: &ConfirmedOrder, tz: Tz) -> NaiveDate {
    order.date.with_timezone(&tz).date_naive()
}

pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

pub fn orders_for_date(orders: &[ConfirmedOrder], date: NaiveDate, tz: Tz) -> Vec<ConfirmedOrder> {
    orders
        .iter()
        .filter(|o| order_day(o, tz) == date)
        .cloned()
        .collect()
}

/// Distinct order days, newest first.
pub fn available_dates(orders: &[ConfirmedOrder], tz: Tz) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = orders.iter().map(|o| order_day(o, tz)).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();
    dates
}

/// Revenue and per-product breakdown for one day. Full and half portions of
/// the same dish are reported on separate rows.
pub fn day_summary(orders: &[ConfirmedOrder], date: NaiveDate, tz: Tz) -> DaySummary {
    let day_orders = orders_for_date(orders, date, tz);

    let revenue: Decimal = day_orders.iter().map(|o| money::to_decimal(o.total)).sum();

    let mut by_name: HashMap<String, (u32, Decimal)> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    for item in day_orders.iter().flat_map(|o| o.items.iter()) {
        let key = item.display_name();
        let entry = by_name.entry(key.clone()).or_insert_with(|| {
            first_seen.push(key);
            (0, Decimal::ZERO)
        });
        entry.0 += item.quantity;
        entry.1 += money::line_total(item);
    }

    let mut products: Vec<ProductSales> = first_seen
        .into_iter()
        .filter_map(|name| {
            by_name.remove(&name).map(|(quantity, total)| ProductSales {
                name,
                quantity,
                total: money::to_f64(total),
            })
        })
        .collect();
    products.sort_by(|a, b| b.total.total_cmp(&a.total));

    DaySummary {
        date: date.format("%Y-%m-%d").to_string(),
        total_revenue: money::to_f64(revenue),
        total_orders: day_orders.len(),
        products,
    }
}
