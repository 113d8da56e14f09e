//! Orders: the persisted result of a completed checkout.
//!
//! An order is immutable once created apart from its status. Line items
//! snapshot the product name and unit price at purchase time so later
//! catalog changes never alter past orders.

pub mod receipt;
pub mod service;

use chrono::{DateTime, Utc};
use serde::Serialize;

use maison_core::{
    Money, OrderId, OrderNumber, OrderStatus, ProductId, ShippingAddress, StatusTracker, UserId,
};

use crate::cart::CartItem;
use crate::checkout::OrderTotals;

pub use receipt::Receipt;
pub use service::{OrderError, OrderService};

/// One purchased product with its price at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

impl From<&CartItem> for LineItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            unit_price: item.product.price,
            quantity: item.quantity,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    /// `None` for guest orders.
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_reference: String,
    pub totals: OrderTotals,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Step tracker for the current status.
    #[must_use]
    pub fn tracker(&self) -> StatusTracker {
        self.status.tracker()
    }

    /// Condensed view for order history listings.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            order_number: self.order_number.clone(),
            created_at: self.created_at,
            status: self.status,
            total: self.totals.total,
            item_count: self.item_count(),
        }
    }
}

/// An order ready to be written; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_reference: String,
    pub totals: OrderTotals,
}

/// One row of an account's order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_number: OrderNumber,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Money,
    pub item_count: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use maison_core::{Address, DEFAULT_COUNTRY, Email};

    use super::*;
    use crate::checkout::PricingPolicy;

    pub(crate) fn shipping(email: &str) -> ShippingAddress {
        ShippingAddress {
            address: Address {
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                address: "12 Marylebone Rd".to_owned(),
                city: "Springfield".to_owned(),
                state: "IL".to_owned(),
                zip_code: "62701".to_owned(),
                country: DEFAULT_COUNTRY.to_owned(),
                phone: "555-0100".to_owned(),
            },
            email: Email::parse(email).unwrap(),
        }
    }

    pub(crate) fn new_order(user_id: Option<UserId>, email: &str) -> NewOrder {
        let items = vec![
            LineItem {
                product_id: ProductId::new("1"),
                name: "Interlocking G Wool Jacket".to_owned(),
                unit_price: Money::from_major(2800),
                quantity: 1,
            },
            LineItem {
                product_id: ProductId::new("7"),
                name: "GG Wool Scarf".to_owned(),
                unit_price: Money::from_major(390),
                quantity: 2,
            },
        ];
        let subtotal = items.iter().map(LineItem::line_total).sum();
        NewOrder {
            user_id,
            status: OrderStatus::Pending,
            items,
            shipping_address: shipping(email),
            payment_reference: "PAY-REF-1".to_owned(),
            totals: PricingPolicy::default().totals(subtotal),
        }
    }

    #[test]
    fn test_line_totals_and_summary() {
        let new = new_order(None, "ada@example.com");
        assert_eq!(new.items[1].line_total(), Money::from_major(780));

        let order = Order {
            id: OrderId::new(1),
            order_number: OrderNumber::parse("482913305").unwrap(),
            user_id: None,
            status: new.status,
            items: new.items,
            shipping_address: new.shipping_address,
            payment_reference: new.payment_reference,
            totals: new.totals,
            created_at: Utc::now(),
        };
        let summary = order.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total, order.totals.total);
        // 3580 + 0 + 286.40
        assert_eq!(summary.total.to_string(), "$3,866.40");
    }
}
