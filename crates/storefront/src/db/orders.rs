//! `PostgreSQL` order repository.
//!
//! Queries are checked at runtime (`query_as` into row structs) and mapped
//! into domain types here; a stored value that no longer parses is reported
//! as [`RepositoryError::DataCorruption`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use maison_core::{
    Address, Email, Money, OrderId, OrderNumber, OrderStatus, ProductId, ShippingAddress, UserId,
};

use super::{OrderRepository, RepositoryError, conflict_on_unique};
use crate::checkout::OrderTotals;
use crate::orders::{LineItem, NewOrder, Order};

const SELECT_ORDERS: &str = r"
    SELECT o.id, o.order_number, o.user_id, o.status, o.payment_reference,
           o.subtotal, o.shipping_cost, o.tax, o.total, o.created_at,
           s.first_name, s.last_name, s.address, s.city, s.state,
           s.zip_code, s.country, s.phone, s.email
    FROM storefront.orders o
    JOIN storefront.shipping_addresses s ON s.order_id = o.id
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: Option<i32>,
    status: String,
    payment_reference: String,
    subtotal: Decimal,
    shipping_cost: Decimal,
    tax: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    first_name: String,
    last_name: String,
    address: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    phone: String,
    email: String,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    order_id: i32,
    product_id: String,
    name: String,
    unit_price: Decimal,
    quantity: i32,
}

/// Position and quantity as stored in `order_items`.
///
/// Values that do not fit the integer columns are rejected before the
/// insert; they are never reported as a conflict.
fn item_columns(position: usize, item: &LineItem) -> Result<(i32, i32), RepositoryError> {
    let position = i32::try_from(position)
        .map_err(|_| RepositoryError::DataCorruption("too many line items".to_owned()))?;
    let quantity = i32::try_from(item.quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!("quantity {} out of range", item.quantity))
    })?;
    Ok((position, quantity))
}

impl ItemRow {
    fn into_line_item(self) -> Result<LineItem, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid quantity {}", self.quantity))
        })?;
        Ok(LineItem {
            product_id: ProductId::new(self.product_id),
            name: self.name,
            unit_price: Money::new(self.unit_price),
            quantity,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Result<Order, RepositoryError> {
        let order_number = OrderNumber::parse(&self.order_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order number in database: {e}"))
        })?;
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            order_number,
            user_id: self.user_id.map(UserId::new),
            status,
            items,
            shipping_address: ShippingAddress {
                address: Address {
                    first_name: self.first_name,
                    last_name: self.last_name,
                    address: self.address,
                    city: self.city,
                    state: self.state,
                    zip_code: self.zip_code,
                    country: self.country,
                    phone: self.phone,
                },
                email,
            },
            payment_reference: self.payment_reference,
            totals: OrderTotals {
                subtotal: Money::new(self.subtotal),
                shipping: Money::new(self.shipping_cost),
                tax: Money::new(self.tax),
                total: Money::new(self.total),
            },
            created_at: self.created_at,
        })
    }
}

/// Orders stored in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach line items to order rows, keeping row order.
    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let item_rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT order_id, product_id, name, unit_price, quantity
            FROM storefront.order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<i32, Vec<LineItem>> = HashMap::new();
        for row in item_rows {
            let order_id = row.order_id;
            items.entry(order_id).or_default().push(row.into_line_item()?);
        }

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    async fn fetch_one(&self, rows: Vec<OrderRow>) -> Result<Option<Order>, RepositoryError> {
        Ok(self.hydrate(rows).await?.into_iter().next())
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, number: &OrderNumber, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO storefront.orders
                (order_number, user_id, status, payment_reference,
                 subtotal, shipping_cost, tax, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at
            ",
        )
        .bind(number.as_str())
        .bind(order.user_id.map(|id| id.as_i32()))
        .bind(order.status.as_str())
        .bind(&order.payment_reference)
        .bind(order.totals.subtotal.amount())
        .bind(order.totals.shipping.amount())
        .bind(order.totals.tax.amount())
        .bind(order.totals.total.amount())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order number"))?;

        let shipping = &order.shipping_address;
        sqlx::query(
            r"
            INSERT INTO storefront.shipping_addresses
                (order_id, first_name, last_name, address, city, state,
                 zip_code, country, phone, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(id)
        .bind(&shipping.address.first_name)
        .bind(&shipping.address.last_name)
        .bind(&shipping.address.address)
        .bind(&shipping.address.city)
        .bind(&shipping.address.state)
        .bind(&shipping.address.zip_code)
        .bind(&shipping.address.country)
        .bind(&shipping.address.phone)
        .bind(shipping.email.as_str())
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            let (position, quantity) = item_columns(position, item)?;
            sqlx::query(
                r"
                INSERT INTO storefront.order_items
                    (order_id, position, product_id, name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(id)
            .bind(position)
            .bind(item.product_id.as_str())
            .bind(&item.name)
            .bind(item.unit_price.amount())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: OrderId::new(id),
            order_number: number.clone(),
            user_id: order.user_id,
            status: order.status,
            items: order.items.clone(),
            shipping_address: order.shipping_address.clone(),
            payment_reference: order.payment_reference.clone(),
            totals: order.totals,
            created_at,
        })
    }

    async fn get_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDERS} WHERE o.order_number = $1"))
            .bind(number.as_str())
            .fetch_all(&self.pool)
            .await?;
        self.fetch_one(rows).await
    }

    async fn find_by_number_and_email(
        &self,
        number: &OrderNumber,
        email: &Email,
    ) -> Result<Option<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDERS} WHERE o.order_number = $1 AND s.email = $2"
        ))
        .bind(number.as_str())
        .bind(email.as_str())
        .fetch_all(&self.pool)
        .await?;
        self.fetch_one(rows).await
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDERS} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.orders
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(id.as_i32())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let exists: Option<(i32,)> =
            sqlx::query_as("SELECT id FROM storefront.orders WHERE id = $1")
                .bind(id.as_i32())
                .fetch_optional(&self.pool)
                .await?;
        match exists {
            Some(_) => Err(RepositoryError::Conflict(format!(
                "order {id} is no longer {from}"
            ))),
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new("3"),
            name: "GG Wool Scarf".to_owned(),
            unit_price: Money::from_major(390),
            quantity,
        }
    }

    #[test]
    fn test_item_columns() {
        assert_eq!(item_columns(2, &item(3)).unwrap(), (2, 3));
    }

    #[test]
    fn test_oversized_quantity_is_not_a_conflict() {
        let err = item_columns(0, &item(u32::MAX)).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));

        let err = item_columns(usize::MAX, &item(1)).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
