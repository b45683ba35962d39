//! Shopfloor Core - Shared domain types.
//!
//! This crate provides the types shared by all Shopfloor components:
//! - `portal` - Customer sign-up, cashier board, catalog and print tooling
//! - `cli` - Migrations and administrative status edits
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. The basket status machine lives here so that the
//! portal, the CLI and the tests all agree on which transitions exist.
//!
//! # Modules
//!
//! - [`types`] - String-keyed ids, statuses, prices, contact details and label styles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
