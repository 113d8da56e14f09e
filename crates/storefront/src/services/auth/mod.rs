//! Authentication service.
//!
//! Email and password accounts with Argon2id hashes. A successful sign-up or
//! sign-in yields an [`AuthSession`]; signing out consumes it.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{info, instrument};

use maison_core::{Email, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{AuthSession, NewProfile, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum username length.
const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum full name length.
const MIN_FULL_NAME_LENGTH: usize = 2;

/// Sign-up form input.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub username: String,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::InvalidProfile` for a bad username or full name.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered,
    /// or `AuthError::UsernameTaken` if the username is.
    #[instrument(skip_all)]
    pub async fn sign_up(&self, form: &SignUp) -> Result<AuthSession, AuthError> {
        let email = Email::parse(&form.email)?;
        validate_password(&form.password)?;
        let profile = NewProfile {
            username: validate_username(&form.username)?,
            full_name: validate_full_name(&form.full_name)?,
        };

        let password_hash = hash_password(&form.password)?;

        let user = self
            .users
            .create_with_password(&email, &password_hash, &profile)
            .await
            .map_err(map_conflict)?;

        info!(user_id = %user.id, "Account created");
        Ok(start_session(&user))
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(start_session(&user))
    }

    /// End a session.
    pub fn sign_out(&self, session: AuthSession) {
        clear_sentry_user();
        info!(user_id = %session.user_id, "Signed out");
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn start_session(user: &User) -> AuthSession {
    set_sentry_user(&user.id, Some(user.email.as_str()));
    AuthSession::from(user)
}

/// Translate a unique-constraint conflict into the account error it means.
pub(crate) fn map_conflict(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(what) if what.starts_with("username") => AuthError::UsernameTaken,
        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
        other => AuthError::Repository(other),
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a username, returning it trimmed.
pub(crate) fn validate_username(username: &str) -> Result<String, AuthError> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(AuthError::InvalidProfile(format!(
            "username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AuthError::InvalidProfile(
            "username can only contain letters, numbers, and underscores".to_owned(),
        ));
    }
    Ok(username.to_owned())
}

/// Validate a full name, returning it trimmed.
pub(crate) fn validate_full_name(full_name: &str) -> Result<String, AuthError> {
    let full_name = full_name.trim();
    if full_name.chars().count() < MIN_FULL_NAME_LENGTH {
        return Err(AuthError::InvalidProfile(format!(
            "full name must be at least {MIN_FULL_NAME_LENGTH} characters"
        )));
    }
    Ok(full_name.to_owned())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
