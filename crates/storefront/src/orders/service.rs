//! Order placement, lookup and fulfillment status changes.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use maison_core::{Email, OrderNumber, OrderStatus, StatusTransitionError, UserId};

use super::{NewOrder, Order, OrderSummary};
use crate::db::{OrderRepository, RepositoryError};

/// How many order numbers to try before giving up on conflicts.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Errors from [`OrderService`].
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// No order matches the lookup.
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    InvalidTransition(#[from] StatusTransitionError),

    /// Every generated order number collided with an existing order.
    #[error("could not allocate a unique order number")]
    NumberExhausted,

    #[error("order storage error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Order operations over an [`OrderRepository`].
#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService").finish_non_exhaustive()
    }
}

impl OrderService {
    #[must_use]
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    /// Persist a new order under a freshly generated order number.
    ///
    /// A number that collides with an existing order is replaced and the
    /// write retried, up to [`MAX_ORDER_NUMBER_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NumberExhausted`] if every attempt collided, or
    /// [`OrderError::Repository`] if the store fails. In both cases no order
    /// was written.
    #[instrument(skip(self, order), fields(items = order.items.len(), guest = order.user_id.is_none()))]
    pub async fn place_order(&self, order: &NewOrder) -> Result<Order, OrderError> {
        self.place_order_with(order, OrderNumber::generate).await
    }

    /// [`place_order`](Self::place_order) with a caller-supplied number source.
    ///
    /// # Errors
    ///
    /// See [`place_order`](Self::place_order).
    pub async fn place_order_with(
        &self,
        order: &NewOrder,
        mut next_number: impl FnMut() -> OrderNumber + Send,
    ) -> Result<Order, OrderError> {
        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let number = next_number();
            match self.repo.create(&number, order).await {
                Ok(created) => {
                    info!(
                        order_number = %created.order_number,
                        total = %created.totals.total,
                        "Order placed"
                    );
                    return Ok(created);
                }
                Err(RepositoryError::Conflict(reason)) => {
                    warn!(attempt, %number, %reason, "Order number collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(OrderError::NumberExhausted)
    }

    /// Guest lookup: both the order number and the shipping email must match.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] unless both match.
    #[instrument(skip(self, email))]
    pub async fn find_order(&self, number: &OrderNumber, email: &Email) -> Result<Order, OrderError> {
        self.repo
            .find_by_number_and_email(number, email)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// Staff lookup by order number alone.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for an unknown number.
    pub async fn get(&self, number: &OrderNumber) -> Result<Order, OrderError> {
        self.repo
            .get_by_number(number)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// All orders of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Repository`] if the store fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.repo.list_by_user(user_id).await?)
    }

    /// Account order history rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Repository`] if the store fails.
    pub async fn order_history(&self, user_id: UserId) -> Result<Vec<OrderSummary>, OrderError> {
        Ok(self
            .list_orders(user_id)
            .await?
            .iter()
            .map(Order::summary)
            .collect())
    }

    /// Move an order to `next` as fulfillment progresses.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] if the lifecycle forbids the
    /// move, or [`OrderError::NotFound`] for an unknown number.
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        number: &OrderNumber,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut order = self.get(number).await?;
        let from = order.status;
        order.status = from.transition_to(next)?;

        self.repo
            .update_status(order.id, from, order.status)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => OrderError::NotFound,
                other => OrderError::Repository(other),
            })?;

        info!(order_number = %number, %from, to = %order.status, "Order status changed");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::orders::tests::new_order;

    fn service() -> OrderService {
        OrderService::new(Arc::new(MemoryRepository::new()))
    }

    fn number(n: &str) -> OrderNumber {
        OrderNumber::parse(n).unwrap()
    }

    #[tokio::test]
    async fn test_place_order_assigns_number_and_pending() {
        let orders = service();
        let placed = orders
            .place_order(&new_order(None, "ada@example.com"))
            .await
            .unwrap();
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.order_number.as_str().len(), OrderNumber::DIGITS);
    }

    #[tokio::test]
    async fn test_collision_is_retried_with_new_number() {
        let orders = service();
        let order = new_order(None, "ada@example.com");
        orders
            .place_order_with(&order, || number("111111111"))
            .await
            .unwrap();

        let mut numbers = vec![number("222222222"), number("111111111")];
        let placed = orders
            .place_order_with(&order, move || numbers.pop().unwrap())
            .await
            .unwrap();
        assert_eq!(placed.order_number, number("222222222"));
    }

    #[tokio::test]
    async fn test_collisions_exhaust_attempts() {
        let orders = service();
        let order = new_order(None, "ada@example.com");
        orders
            .place_order_with(&order, || number("111111111"))
            .await
            .unwrap();

        let err = orders
            .place_order_with(&order, || number("111111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::NumberExhausted));
    }

    #[tokio::test]
    async fn test_find_order_needs_both_fields() {
        let orders = service();
        let placed = orders
            .place_order(&new_order(None, "ada@example.com"))
            .await
            .unwrap();

        let mixed_case = Email::parse("ADA@example.com").unwrap();
        assert_eq!(
            orders
                .find_order(&placed.order_number, &mixed_case)
                .await
                .unwrap()
                .id,
            placed.id
        );

        let wrong = Email::parse("eve@example.com").unwrap();
        assert!(matches!(
            orders
                .find_order(&placed.order_number, &wrong)
                .await
                .unwrap_err(),
            OrderError::NotFound
        ));
        let ada = Email::parse("ada@example.com").unwrap();
        assert!(matches!(
            orders.find_order(&number("999999999"), &ada).await.unwrap_err(),
            OrderError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let orders = service();
        let user = UserId::new(3);
        let first = orders
            .place_order(&new_order(Some(user), "ada@example.com"))
            .await
            .unwrap();
        let second = orders
            .place_order(&new_order(Some(user), "ada@example.com"))
            .await
            .unwrap();

        let history = orders.order_history(user).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].order_number, second.order_number);
        assert_eq!(history[1].order_number, first.order_number);
        assert_eq!(history[0].item_count, 3);
        assert!(orders.order_history(UserId::new(4)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_advance_status_follows_lifecycle() {
        let orders = service();
        let placed = orders
            .place_order(&new_order(None, "ada@example.com"))
            .await
            .unwrap();
        let number = placed.order_number;

        let processing = orders
            .advance_status(&number, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(processing.status, OrderStatus::Processing);

        let err = orders
            .advance_status(&number, OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));

        orders
            .advance_status(&number, OrderStatus::Shipped)
            .await
            .unwrap();
        let stored = orders.get(&number).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Shipped);
        assert!(matches!(
            orders
                .advance_status(&number, OrderStatus::Cancelled)
                .await
                .unwrap_err(),
            OrderError::InvalidTransition(_)
        ));
    }
}
