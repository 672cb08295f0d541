//! Cart pricing: subtotal, tax, shipping and total.
//!
//! The same computation runs on the server when an order is placed (and its
//! totals frozen) and on the client when a cart is displayed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Store-wide pricing constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Tax as a fraction of the subtotal (0.18 = 18% GST).
    pub tax_rate: Decimal,
    /// Shipping charged when the address is outside the free-shipping city.
    pub flat_shipping_fee: Money,
    /// City name that ships free, matched case-insensitively as a substring
    /// of the delivery address.
    pub free_shipping_city: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(18, 2),
            flat_shipping_fee: Money::from_major(100),
            free_shipping_city: "surat".to_owned(),
        }
    }
}

impl PricingPolicy {
    /// Shipping for a delivery address.
    ///
    /// Free iff the address contains the free-shipping city, ignoring case.
    /// This is a plain substring test on free text, so "Suratgarh" also ships
    /// free.
    #[must_use]
    pub fn shipping_for(&self, address: &str) -> Money {
        let city = self.free_shipping_city.trim().to_lowercase();
        if !city.is_empty() && address.to_lowercase().contains(&city) {
            Money::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// Price a set of lines for delivery to `address`.
    #[must_use]
    pub fn price<'a, I>(&self, lines: I, address: &str) -> CartTotals
    where
        I: IntoIterator<Item = &'a PricedLine>,
    {
        let subtotal: Money = lines.into_iter().map(PricedLine::line_total).sum();
        let tax = subtotal * self.tax_rate;
        let shipping = self.shipping_for(address);

        CartTotals {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }
}

/// A unit price and quantity pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Money,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub const fn new(unit_price: Money, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Computed totals for a cart or order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: u32) -> PricedLine {
        PricedLine::new(Money::from_major(price), quantity)
    }

    #[test]
    fn test_reference_scenario() {
        let policy = PricingPolicy::default();
        let totals = policy.price(&[line(500, 2)], "12 MG Road, Bengaluru");

        assert_eq!(totals.subtotal, Money::from_major(1000));
        assert_eq!(totals.tax, Money::from_major(180));
        assert_eq!(totals.shipping, Money::from_major(100));
        assert_eq!(totals.total, Money::from_major(1280));
    }

    #[test]
    fn test_subtotal_is_exact_sum() {
        let policy = PricingPolicy::default();
        let lines = [
            PricedLine::new(Money::new(Decimal::new(19_999, 2)), 3),
            line(45, 7),
            line(1, 1),
        ];
        let totals = policy.price(&lines, "");
        // 599.97 + 315 + 1
        assert_eq!(totals.subtotal.amount(), Decimal::new(91_597, 2));
    }

    #[test]
    fn test_zero_quantity_line_changes_nothing() {
        let policy = PricingPolicy::default();
        let without = policy.price(&[line(250, 4)], "Pune");
        let with = policy.price(&[line(250, 4), line(999, 0)], "Pune");
        assert_eq!(without, with);
    }

    #[test]
    fn test_total_identity() {
        let policy = PricingPolicy::default();
        for (lines, address) in [
            (vec![line(120, 3), line(75, 10)], "Ring Road, SURAT"),
            (vec![line(3, 1)], "Jaipur"),
            (vec![], "surat"),
        ] {
            let t = policy.price(&lines, address);
            assert_eq!(
                t.total,
                t.subtotal + t.subtotal * Decimal::new(18, 2) + t.shipping
            );
        }
    }

    #[test]
    fn test_free_shipping_is_case_insensitive_substring() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping_for("Textile Market, Surat 395002"), Money::ZERO);
        assert_eq!(policy.shipping_for("SURAT"), Money::ZERO);
        assert_eq!(policy.shipping_for("Suratgarh, Rajasthan"), Money::ZERO);
        assert_eq!(policy.shipping_for("Ahmedabad"), Money::from_major(100));
        assert_eq!(policy.shipping_for(""), Money::from_major(100));
    }

    #[test]
    fn test_blank_city_never_matches() {
        let policy = PricingPolicy {
            free_shipping_city: "  ".to_owned(),
            ..PricingPolicy::default()
        };
        assert_eq!(policy.shipping_for("anywhere"), Money::from_major(100));
    }

    #[test]
    fn test_empty_cart_totals_only_shipping() {
        let lines: [PricedLine; 0] = [];
        let totals = PricingPolicy::default().price(&lines, "Delhi");
        assert!(totals.subtotal.is_zero());
        assert_eq!(totals.total, Money::from_major(100));
    }
}
