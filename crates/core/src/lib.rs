//! RocketShoes Core - Shared cart and catalog types.
//!
//! This crate provides the types used by the cart manager and the CLI:
//! - `ProductId` - type-safe product reference
//! - `Product` and `StockInfo` - what the catalog returns
//! - `LineItem` and `Cart` - what the cart holds and persists
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. The `rocketshoes-cart` crate owns all side effects.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, catalog records, line items and cart snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
