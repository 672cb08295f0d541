//! Orders and their item snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;

use loomline_core::{Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order.
///
/// Totals are fixed at creation; later price changes never touch them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Human-readable status, e.g. "Pending Payment".
    pub status_label: &'static str,
    /// Delivery address copied from the profile at checkout.
    pub address: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    /// Filled in for back-office views only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<OrderCustomer>,
}

/// Who placed an order, as shown in the back-office.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub name: String,
    pub business_name: String,
    pub email: String,
    pub phone: String,
}

/// One line of an order: a snapshot of the product at purchase time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Database row for `storefront.order`.
#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: String,
    pub address: String,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

/// Database row for `storefront.order_item`.
#[derive(Debug, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub unit_price: Money,
    pub quantity: i32,
}
