//! `PostgreSQL` user repository.
//!
//! Accounts, password hashes and profiles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use maison_core::{Email, UserId};

use super::{RepositoryError, UserRepository, conflict_on_unique};
use crate::models::{NewProfile, Profile, ProfileUpdate, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(User {
            id: UserId::new(self.id),
            email,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PasswordRow {
    id: i32,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    password_hash: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: i32,
    username: String,
    full_name: String,
    avatar_url: Option<String>,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: UserId::new(row.user_id),
            username: row.username,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            phone_number: row.phone_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Accounts stored in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_with_password(
        &self,
        email: &Email,
        password_hash: &str,
        profile: &NewProfile,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.users (email)
            VALUES ($1)
            RETURNING id, email, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?
        .into_user()?;

        sqlx::query(
            r"
            INSERT INTO storefront.user_passwords (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id.as_i32())
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO storefront.profiles (user_id, username, full_name)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user.id.as_i32())
        .bind(&profile.username)
        .bind(&profile.full_name)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "username"))?;

        tx.commit().await?;

        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, created_at, updated_at
            FROM storefront.users
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .map(UserRow::into_user)
        .transpose()
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, PasswordRow>(
            r"
            SELECT u.id, u.email, u.created_at, u.updated_at, p.password_hash
            FROM storefront.users u
            LEFT JOIN storefront.user_passwords p ON u.id = p.user_id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let Some(password_hash) = r.password_hash else {
            return Ok(None);
        };

        let user = UserRow {
            id: r.id,
            email: r.email,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
        .into_user()?;

        Ok(Some((user, password_hash)))
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT user_id, username, full_name, avatar_url, phone_number,
                   created_at, updated_at
            FROM storefront.profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            UPDATE storefront.profiles
            SET username = COALESCE($2, username),
                full_name = COALESCE($3, full_name),
                updated_at = now()
            WHERE user_id = $1
            RETURNING user_id, username, full_name, avatar_url, phone_number,
                      created_at, updated_at
            ",
        )
        .bind(user_id.as_i32())
        .bind(update.username.as_deref())
        .bind(update.full_name.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "username"))?;

        row.map(Profile::from).ok_or(RepositoryError::NotFound)
    }
}
