//! Domain models for the storefront account area.

pub mod session;
pub mod user;

pub use session::AuthSession;
pub use user::{NewProfile, Profile, ProfileUpdate, User};
