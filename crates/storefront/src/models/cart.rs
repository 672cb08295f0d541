//! Cart view returned by `GET /api/cart`.

use serde::Serialize;

use loomline_core::{CartTotals, Money, PricedLine, PricingPolicy};

use super::ProductSummary;

/// One product in the cart with its current price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: ProductSummary,
    pub quantity: u32,
    pub line_total: Money,
}

impl CartLine {
    #[must_use]
    pub fn new(product: ProductSummary, quantity: u32) -> Self {
        let line_total = PricedLine::new(product.price, quantity).line_total();
        Self {
            product,
            quantity,
            line_total,
        }
    }

    #[must_use]
    pub const fn priced(&self) -> PricedLine {
        PricedLine::new(self.product.price, self.quantity)
    }
}

/// The whole cart, priced for the owner's delivery address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub item_count: u32,
    pub totals: CartTotals,
}

impl CartView {
    #[must_use]
    pub fn price(items: Vec<CartLine>, policy: &PricingPolicy, address: &str) -> Self {
        let priced: Vec<PricedLine> = items.iter().map(CartLine::priced).collect();
        let totals = policy.price(&priced, address);
        let item_count = items.iter().map(|l| l.quantity).sum();

        Self {
            items,
            item_count,
            totals,
        }
    }
}
