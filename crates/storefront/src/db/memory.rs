//! In-memory repositories.
//!
//! Used when no database is configured and in tests. Nothing survives the
//! process. Clones share the same data.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use maison_core::{Email, OrderId, OrderNumber, OrderStatus, UserId};

use super::{OrderRepository, RepositoryError, UserRepository};
use crate::models::{NewProfile, Profile, ProfileUpdate, User};
use crate::orders::{NewOrder, Order};

#[derive(Debug, Default)]
struct Tables {
    orders: Vec<Order>,
    users: Vec<User>,
    passwords: HashMap<UserId, String>,
    profiles: HashMap<UserId, Profile>,
    next_order_id: i32,
    next_user_id: i32,
}

/// Orders and accounts held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn create(&self, number: &OrderNumber, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.orders.iter().any(|o| &o.order_number == number) {
            return Err(RepositoryError::Conflict(
                "order number already exists".to_owned(),
            ));
        }

        tables.next_order_id += 1;
        let created = Order {
            id: OrderId::new(tables.next_order_id),
            order_number: number.clone(),
            user_id: order.user_id,
            status: order.status,
            items: order.items.clone(),
            shipping_address: order.shipping_address.clone(),
            payment_reference: order.payment_reference.clone(),
            totals: order.totals,
            created_at: Utc::now(),
        };
        tables.orders.push(created.clone());
        Ok(created)
    }

    async fn get_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| &o.order_number == number)
            .cloned())
    }

    async fn find_by_number_and_email(
        &self,
        number: &OrderNumber,
        email: &Email,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .find(|o| &o.order_number == number && &o.shipping_address.email == email)
            .cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if order.status != from {
            return Err(RepositoryError::Conflict(format!(
                "order {id} is no longer {from}"
            )));
        }
        order.status = to;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        profile: &NewProfile,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        if tables
            .profiles
            .values()
            .any(|p| p.username == profile.username)
        {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(tables.next_user_id),
            email: email.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        tables.passwords.insert(user.id, password_hash.to_owned());
        tables.profiles.insert(
            user.id,
            Profile {
                user_id: user.id,
                username: profile.username.clone(),
                full_name: profile.full_name.clone(),
                avatar_url: None,
                phone_number: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        let Some(user) = tables.users.iter().find(|u| &u.email == email) else {
            return Ok(None);
        };
        Ok(tables
            .passwords
            .get(&user.id)
            .map(|hash| (user.clone(), hash.clone())))
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&user_id).cloned())
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let mut tables = self.tables.write().await;
        if let Some(username) = &update.username
            && tables
                .profiles
                .values()
                .any(|p| p.user_id != user_id && &p.username == username)
        {
            return Err(RepositoryError::Conflict(
                "username already exists".to_owned(),
            ));
        }

        let profile = tables
            .profiles
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        if let Some(username) = &update.username {
            profile.username.clone_from(username);
        }
        if let Some(full_name) = &update.full_name {
            profile.full_name.clone_from(full_name);
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::orders::tests::new_order;

    fn number(n: &str) -> OrderNumber {
        OrderNumber::parse(n).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_order_number_conflicts() {
        let repo = MemoryRepository::new();
        let order = new_order(None, "ada@example.com");
        repo.create(&number("100000001"), &order).await.unwrap();

        let err = repo.create(&number("100000001"), &order).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_lookup_requires_matching_email() {
        let repo = MemoryRepository::new();
        let created = repo
            .create(&number("100000002"), &new_order(None, "ada@example.com"))
            .await
            .unwrap();

        let ada = Email::parse("ada@example.com").unwrap();
        let eve = Email::parse("eve@example.com").unwrap();
        let found = repo
            .find_by_number_and_email(&created.order_number, &ada)
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, created.id);
        assert!(
            repo.find_by_number_and_email(&created.order_number, &eve)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_by_user_newest_first() {
        let repo = MemoryRepository::new();
        let user = Some(UserId::new(7));
        let first = repo
            .create(&number("100000003"), &new_order(user, "ada@example.com"))
            .await
            .unwrap();
        let second = repo
            .create(&number("100000004"), &new_order(user, "ada@example.com"))
            .await
            .unwrap();
        repo.create(&number("100000005"), &new_order(None, "ada@example.com"))
            .await
            .unwrap();

        let listed = repo.list_by_user(UserId::new(7)).await.unwrap();
        let ids: Vec<OrderId> = listed.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_update_status_is_compare_and_set() {
        let repo = MemoryRepository::new();
        let order = repo
            .create(&number("100000006"), &new_order(None, "ada@example.com"))
            .await
            .unwrap();

        repo.update_status(order.id, OrderStatus::Pending, OrderStatus::Processing)
            .await
            .unwrap();
        let err = repo
            .update_status(order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert!(matches!(
            repo.update_status(OrderId::new(99), OrderStatus::Pending, OrderStatus::Processing)
                .await
                .unwrap_err(),
            RepositoryError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_user_and_profile_lifecycle() {
        let repo = MemoryRepository::new();
        let email = Email::parse("ada@example.com").unwrap();
        let profile = NewProfile {
            username: "ada_l".to_owned(),
            full_name: "Ada Lovelace".to_owned(),
        };
        let user = repo
            .create_with_password(&email, "hash", &profile)
            .await
            .unwrap();

        let (found, hash) = repo.get_password_hash(&email).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");

        assert!(matches!(
            repo.create_with_password(&email, "hash", &profile)
                .await
                .unwrap_err(),
            RepositoryError::Conflict(_)
        ));

        let updated = repo
            .update_profile(
                user.id,
                &ProfileUpdate {
                    full_name: Some("Augusta Ada King".to_owned()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "ada_l");
        assert_eq!(updated.full_name, "Augusta Ada King");
    }
}
