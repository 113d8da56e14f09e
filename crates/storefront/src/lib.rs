//! Maison Storefront library.
//!
//! This crate provides the storefront functionality as a library, allowing
//! it to be tested and reused by the `maison` binary and the admin tooling.
//!
//! # Modules
//!
//! - [`catalog`] - Product catalog with filtering, search and sorting
//! - [`cart`] - Persistent cart store with change notifications
//! - [`checkout`] - Shipping, billing and payment steps ending in an order
//! - [`orders`] - Order placement, lookup, history and receipts
//! - [`services`] - Authentication and profiles
//! - [`db`] - Repository traits with `PostgreSQL` and in-memory backends

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod orders;
pub mod services;
pub mod state;
