//! Authenticated session state.

use serde::Serialize;

use maison_core::{Email, UserId};

use super::user::User;

/// The signed-in identity.
///
/// Holding one is what makes a customer a member rather than a guest at
/// checkout and what scopes order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    /// User's database ID.
    pub user_id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<&User> for AuthSession {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
        }
    }
}
