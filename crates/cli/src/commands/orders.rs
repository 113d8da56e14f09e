//! Order fulfillment commands.
//!
//! The storefront only ever writes `pending`; everything after that is moved
//! along from here.

use std::sync::Arc;

use maison_core::{OrderNumber, OrderStatus};
use maison_storefront::db::PgOrderRepository;
use maison_storefront::orders::{OrderService, Receipt};

use super::{CommandError, connect};

async fn service() -> Result<OrderService, CommandError> {
    let pool = connect().await?;
    Ok(OrderService::new(Arc::new(PgOrderRepository::new(pool))))
}

/// Print an order receipt.
pub async fn show(order_number: &str) -> Result<(), CommandError> {
    let number = OrderNumber::parse(order_number)?;
    let order = service().await?.get(&number).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", Receipt::new(&order));
    }
    Ok(())
}

/// Move an order to a new status.
pub async fn set_status(order_number: &str, status: &str) -> Result<(), CommandError> {
    let number = OrderNumber::parse(order_number)?;
    let next: OrderStatus = status.parse()?;

    let order = service().await?.advance_status(&number, next).await?;
    tracing::info!(order_number = %order.order_number, status = %order.status, "Order updated");
    Ok(())
}
