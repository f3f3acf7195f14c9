use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PortionType {
    #[default]
    Unit,
    Ration,
}

/// Full or half portion of a product.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Full,
    Half,
}

impl Variant {
    pub fn is_half(self) -> bool {
        self == Variant::Half
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub display_order: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub portion_type: PortionType,
    #[serde(default)]
    pub half_price: Option<f64>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A cart or order line. Name, price and image are snapshots taken when the
/// line was created.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderLineItem {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    pub category: String,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Variant,
}

impl OrderLineItem {
    pub fn key(&self) -> (&str, Variant) {
        (&self.product_id, self.variant)
    }

    pub fn display_name(&self) -> String {
        if self.variant.is_half() {
            format!("{} (Media)", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileTransfer,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConfirmedOrder {
    pub id: String,
    pub order_number: u32,
    pub items: Vec<OrderLineItem>,
    pub total: f64,
    /// Confirmation time, carrying the reporting timezone's offset.
    pub date: DateTime<FixedOffset>,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductSales {
    pub name: String,
    pub quantity: u32,
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DaySummary {
    pub date: String,
    pub total_revenue: f64,
    pub total_orders: usize,
    pub products: Vec<ProductSales>,
}
