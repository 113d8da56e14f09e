//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for the `maison` binary. Every command
//! returns `Result<T, AppError>`; [`AppError::report`] captures remote
//! failures to Sentry before the message is shown to the customer.

use maison_core::{EmailError, OrderNumberError, ParseEnumError};
use thiserror::Error;

use crate::cart::StorageError;
use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::orders::OrderError;
use crate::services::auth::AuthError;

/// How an error surfaces to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input must be corrected; nothing changed.
    Validation,
    /// A lookup matched nothing.
    NotFound,
    /// The data service or local storage failed.
    RemoteFailure,
    /// Stored data could not be decoded.
    CorruptState,
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cart storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Order(#[from] OrderError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),

    #[error("{0}")]
    InvalidChoice(#[from] ParseEnumError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Command needs a signed-in customer.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad input from the command line.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Classify the error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Database(err) => repository_category(err),
            Self::Catalog(_) => ErrorCategory::CorruptState,
            Self::Storage(StorageError::InvalidKey(_))
            | Self::InvalidEmail(_)
            | Self::InvalidOrderNumber(_)
            | Self::InvalidChoice(_)
            | Self::Unauthorized(_)
            | Self::BadRequest(_)
            | Self::Config(_) => ErrorCategory::Validation,
            Self::Storage(StorageError::Io(_)) => ErrorCategory::RemoteFailure,
            Self::Checkout(err) => match err {
                CheckoutError::OrderCreation(err) => order_category(err),
                _ => ErrorCategory::Validation,
            },
            Self::Order(err) => order_category(err),
            Self::Auth(err) => auth_category(err),
            Self::NotFound(_) => ErrorCategory::NotFound,
        }
    }

    /// Message safe to show the customer.
    ///
    /// Internal details of remote and corrupt-state failures are hidden.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::UsernameTaken => "This username is already taken".to_string(),
                AuthError::WeakPassword(msg) | AuthError::InvalidProfile(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
            },
            Self::Checkout(CheckoutError::OrderCreation(_)) => {
                "There was a problem processing your order. Please try again.".to_string()
            }
            Self::Order(OrderError::NotFound) => {
                "Order not found. Please check your order number and email.".to_string()
            }
            _ => match self.category() {
                ErrorCategory::RemoteFailure => "Service unavailable, please try again".to_string(),
                ErrorCategory::CorruptState => "Stored data is unreadable".to_string(),
                ErrorCategory::Validation | ErrorCategory::NotFound => self.to_string(),
            },
        }
    }

    /// Capture remote failures and corrupt state to Sentry.
    pub fn report(&self) {
        if matches!(
            self.category(),
            ErrorCategory::RemoteFailure | ErrorCategory::CorruptState
        ) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        } else {
            tracing::debug!(error = %self, "Command rejected");
        }
    }
}

const fn repository_category(err: &RepositoryError) -> ErrorCategory {
    match err {
        RepositoryError::NotFound => ErrorCategory::NotFound,
        RepositoryError::DataCorruption(_) => ErrorCategory::CorruptState,
        RepositoryError::Conflict(_) => ErrorCategory::Validation,
        RepositoryError::Database(_) => ErrorCategory::RemoteFailure,
    }
}

const fn order_category(err: &OrderError) -> ErrorCategory {
    match err {
        OrderError::NotFound => ErrorCategory::NotFound,
        OrderError::InvalidTransition(_) => ErrorCategory::Validation,
        OrderError::NumberExhausted => ErrorCategory::RemoteFailure,
        OrderError::Repository(err) => repository_category(err),
    }
}

const fn auth_category(err: &AuthError) -> ErrorCategory {
    match err {
        AuthError::UserNotFound => ErrorCategory::NotFound,
        AuthError::Repository(err) => repository_category(err),
        AuthError::PasswordHash => ErrorCategory::RemoteFailure,
        AuthError::InvalidEmail(_)
        | AuthError::InvalidCredentials
        | AuthError::UserAlreadyExists
        | AuthError::UsernameTaken
        | AuthError::WeakPassword(_)
        | AuthError::InvalidProfile(_) => ErrorCategory::Validation,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use maison_core::{OrderStatus, StatusTransitionError};

    use super::*;
    use crate::checkout::form::{Field, FormError};

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 6".to_string());
        assert_eq!(err.to_string(), "Not found: product 6");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_categories() {
        let missing = CheckoutError::Validation(FormError::MissingFields(vec![Field::City]));
        assert_eq!(
            AppError::from(missing).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AppError::from(OrderError::NotFound).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            AppError::from(CheckoutError::OrderCreation(OrderError::NumberExhausted)).category(),
            ErrorCategory::RemoteFailure
        );
        assert_eq!(
            AppError::from(RepositoryError::DataCorruption("bad status".into())).category(),
            ErrorCategory::CorruptState
        );
        let transition = StatusTransitionError {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            AppError::from(OrderError::from(transition)).category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AppError::from(RepositoryError::DataCorruption("orders.status = ?".into()));
        assert!(!err.user_message().contains("orders.status"));

        let err = AppError::from(AuthError::Repository(RepositoryError::NotFound));
        assert_eq!(err.user_message(), "Authentication error");

        let err = AppError::from(CheckoutError::MissingPaymentReference);
        assert_eq!(err.user_message(), "Please enter a payment reference");

        let err = AppError::from(AuthError::InvalidCredentials);
        assert_eq!(err.user_message(), "Invalid credentials");
    }
}
