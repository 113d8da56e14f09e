//! Core types for Maison.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod order_number;
pub mod product;
pub mod status;

pub use address::{Address, DEFAULT_COUNTRY, ShippingAddress};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use order_number::{OrderNumber, OrderNumberError};
pub use product::{Category, Gender, ParseEnumError, Product, ProductId};
pub use status::*;
