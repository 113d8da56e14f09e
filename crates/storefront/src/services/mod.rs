//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Account sign-up, sign-in and sign-out (Argon2id passwords)
//! - `profile` - Reading and editing the signed-in customer's profile
//!
//! Order placement and lookup live in [`crate::orders`].

pub mod auth;
pub mod profile;

pub use auth::{AuthError, AuthService, SignUp};
pub use profile::ProfileService;
