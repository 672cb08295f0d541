//! Response and request bodies of the storefront API, as the client sees
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loomline_core::{
    BannerId, CartTotals, CategoryId, Email, Money, OrderId, OrderItemId, Phone, ProductId, Role,
    UserId,
};

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub phone: Phone,
    pub name: String,
    pub business_name: String,
    pub address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sign-up form.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub business_name: String,
    pub address: String,
    pub password: String,
}

/// Profile edit. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithProducts {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub placement: String,
    pub title: String,
    pub description: String,
    pub desktop_image_url: String,
    pub mobile_image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: ProductSummary,
    pub quantity: u32,
    pub line_total: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: u32,
    pub totals: CartTotals,
}

impl CartView {
    /// An empty cart has no lines; lines always carry quantity >= 1.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|line| line.quantity == 0)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Machine status, e.g. `pending_payment`.
    pub status: String,
    /// Display status, e.g. "Pending Payment".
    pub status_label: String,
    pub address: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Manual UPI payment details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiSettings {
    pub upi_id: String,
    pub qr_code_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cart_view_decodes_server_shape() {
        let cart: CartView = serde_json::from_value(json!({
            "items": [{
                "product": {"id": 4, "name": "Linen shirt", "price": "500.00", "image": null},
                "quantity": 2,
                "lineTotal": "1000.00"
            }],
            "itemCount": 2,
            "totals": {"subtotal": "1000.00", "tax": "180.00", "shipping": "100.00", "total": "1280.00"}
        }))
        .unwrap();

        assert!(!cart.is_empty());
        assert_eq!(cart.totals.total, Money::from_major(1280));
        assert!(CartView::default().is_empty());
    }

    #[test]
    fn test_profile_update_omits_unchanged_fields() {
        let update = ProfileUpdate {
            address: Some("Ring Road, Surat".to_owned()),
            ..ProfileUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"address": "Ring Road, Surat"})
        );
    }
}
