//! Maison Core - Shared domain types.
//!
//! This crate provides the types shared by every Maison component:
//! - `storefront` - Catalog, cart, checkout and order tracking client
//! - `cli` - Migrations and the fulfillment tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for ids, money, emails, order numbers, products,
//!   addresses and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
