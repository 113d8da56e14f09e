//! Order tracking and history.

use maison_core::{Email, OrderNumber, StepState};
use maison_storefront::error::AppError;
use maison_storefront::orders::{Order, Receipt};
use maison_storefront::state::AppState;

use super::Credentials;

/// Guest order lookup.
pub async fn track(
    state: &AppState,
    order_number: &str,
    email: &str,
    receipt: bool,
) -> Result<(), AppError> {
    let number = OrderNumber::parse(order_number)?;
    let email = Email::parse(email)?;
    let order = state.orders().find_order(&number, &email).await?;

    if receipt {
        println!("{}", Receipt::new(&order));
    } else {
        print_order(&order);
    }
    Ok(())
}

/// Order history of the signed-in customer.
pub async fn history(state: &AppState, credentials: &Credentials) -> Result<(), AppError> {
    let session = credentials.require(state).await?;
    let summaries = state.orders().order_history(session.user_id).await?;

    if summaries.is_empty() {
        println!("No orders yet");
        return Ok(());
    }
    for summary in summaries {
        println!(
            "#{}  {}  {:<10}  {:>3} items  {:>12}",
            summary.order_number,
            summary.created_at.format("%b %-d, %Y"),
            summary.status.as_str(),
            summary.item_count,
            summary.total.to_string()
        );
    }
    Ok(())
}

fn print_order(order: &Order) {
    println!("Order #{}", order.order_number);
    println!("Placed {}", order.created_at.format("%B %-d, %Y"));
    println!();

    let tracker = order.tracker();
    if tracker.cancelled {
        println!("This order was cancelled");
    } else {
        for step in &tracker.steps {
            let mark = match step.state {
                StepState::Completed => "[x]",
                StepState::Current => "[>]",
                StepState::Upcoming => "[ ]",
            };
            println!("{mark} {}", step.label);
        }
    }
    println!();

    for item in &order.items {
        println!(
            "{} x {:<32} {:>12}",
            item.quantity,
            item.name,
            item.line_total().to_string()
        );
    }
    println!("Total {}", order.totals.total);
    println!();
    println!("Ship to:");
    println!("{}", order.shipping_address);
}
