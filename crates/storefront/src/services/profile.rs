//! Customer profile reads and edits.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::db::{RepositoryError, UserRepository};
use crate::models::{AuthSession, Profile, ProfileUpdate};
use crate::services::auth::{AuthError, map_conflict, validate_full_name, validate_username};

/// Profile operations for a signed-in user.
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService").finish_non_exhaustive()
    }
}

impl ProfileService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// The profile of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account has no profile.
    pub async fn get(&self, session: &AuthSession) -> Result<Profile, AuthError> {
        self.users
            .get_profile(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Change username and/or full name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidProfile` for invalid values,
    /// `AuthError::UsernameTaken` if the username belongs to someone else and
    /// `AuthError::UserNotFound` if the account has no profile.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn update(
        &self,
        session: &AuthSession,
        update: &ProfileUpdate,
    ) -> Result<Profile, AuthError> {
        if update.is_empty() {
            return self.get(session).await;
        }

        let validated = ProfileUpdate {
            username: update.username.as_deref().map(validate_username).transpose()?,
            full_name: update
                .full_name
                .as_deref()
                .map(validate_full_name)
                .transpose()?,
        };

        let profile = self
            .users
            .update_profile(session.user_id, &validated)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => map_conflict(other),
            })?;

        info!("Profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::services::auth::{AuthService, SignUp};

    async fn signed_up(repo: &Arc<MemoryRepository>, email: &str, username: &str) -> AuthSession {
        AuthService::new(repo.clone())
            .sign_up(&SignUp {
                email: email.to_owned(),
                password: "s3cret!".to_owned(),
                full_name: "Ada Lovelace".to_owned(),
                username: username.to_owned(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_and_update_profile() {
        let repo = Arc::new(MemoryRepository::new());
        let session = signed_up(&repo, "ada@example.com", "ada_l").await;
        let profiles = ProfileService::new(repo);

        let profile = profiles.get(&session).await.unwrap();
        assert_eq!(profile.username, "ada_l");
        assert_eq!(profile.full_name, "Ada Lovelace");

        let updated = profiles
            .update(
                &session,
                &ProfileUpdate {
                    username: Some("countess".to_owned()),
                    full_name: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "countess");
        assert_eq!(updated.full_name, "Ada Lovelace");
        assert!(updated.updated_at >= profile.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_or_invalid_username() {
        let repo = Arc::new(MemoryRepository::new());
        signed_up(&repo, "eve@example.com", "eve").await;
        let session = signed_up(&repo, "ada@example.com", "ada_l").await;
        let profiles = ProfileService::new(repo);

        let taken = ProfileUpdate {
            username: Some("eve".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            profiles.update(&session, &taken).await.unwrap_err(),
            AuthError::UsernameTaken
        ));

        let invalid = ProfileUpdate {
            username: Some("no spaces".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            profiles.update(&session, &invalid).await.unwrap_err(),
            AuthError::InvalidProfile(_)
        ));
    }
}
