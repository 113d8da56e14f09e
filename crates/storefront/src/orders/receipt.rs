//! Printable order receipts.

use std::fmt;

use maison_core::Money;

use super::Order;

const WIDTH: usize = 56;

/// Plain-text receipt for an order.
///
/// Rendered through [`fmt::Display`] so it can be printed, written to a file
/// or attached to an email unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Receipt<'a> {
    order: &'a Order,
}

impl<'a> Receipt<'a> {
    #[must_use]
    pub const fn new(order: &'a Order) -> Self {
        Self { order }
    }
}

fn amount_line(f: &mut fmt::Formatter<'_>, label: &str, amount: Money) -> fmt::Result {
    let amount = amount.to_string();
    let pad = WIDTH.saturating_sub(label.chars().count());
    writeln!(f, "{label}{amount:>pad$}")
}

impl fmt::Display for Receipt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = self.order;
        let rule = "-".repeat(WIDTH);

        writeln!(f, "MAISON")?;
        writeln!(f, "Order #{}", order.order_number)?;
        writeln!(f, "Placed {}", order.created_at.format("%B %-d, %Y"))?;
        writeln!(f, "Status: {}", order.status)?;
        writeln!(f, "{rule}")?;

        for item in &order.items {
            let label = format!("{} x {}", item.quantity, item.name);
            amount_line(f, &label, item.line_total())?;
            if item.quantity > 1 {
                writeln!(f, "    {} each", item.unit_price)?;
            }
        }

        writeln!(f, "{rule}")?;
        amount_line(f, "Subtotal", order.totals.subtotal)?;
        if order.totals.shipping == Money::ZERO {
            let pad = WIDTH - "Shipping".len();
            writeln!(f, "Shipping{:>pad$}", "Free")?;
        } else {
            amount_line(f, "Shipping", order.totals.shipping)?;
        }
        amount_line(f, "Tax", order.totals.tax)?;
        amount_line(f, "Total", order.totals.total)?;
        writeln!(f, "{rule}")?;

        writeln!(f, "Ship to:")?;
        writeln!(f, "{}", order.shipping_address)?;
        writeln!(f)?;
        write!(f, "Payment reference: {}", order.payment_reference)
    }
}
