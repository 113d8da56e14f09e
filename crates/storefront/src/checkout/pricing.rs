//! Order totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use maison_core::Money;

/// How shipping and tax are charged on a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Orders with a subtotal strictly above this ship free.
    pub free_shipping_threshold: Money,
    /// Shipping charged at or below the threshold.
    pub flat_shipping: Money,
    /// Tax as a fraction of the subtotal.
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_major(200),
            flat_shipping: Money::from_major(20),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

impl PricingPolicy {
    /// Compute the totals for a subtotal.
    #[must_use]
    pub fn totals(&self, subtotal: Money) -> OrderTotals {
        let shipping = if subtotal > self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_shipping
        };
        let tax = subtotal.percent(self.tax_rate);
        OrderTotals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

/// Subtotal, shipping, tax and grand total of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}
