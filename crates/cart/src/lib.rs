//! RocketShoes Cart - Shopping cart state for the storefront.
//!
//! The [`CartManager`] keeps an ordered list of line items, validates
//! quantities against the catalog's stock endpoint, and mirrors every change
//! into a persistence slot.
//!
//! # Architecture
//!
//! - [`catalog`] - `CatalogService` seam and the `reqwest`-based REST client
//! - [`storage`] - `PersistenceSlot` seam with memory and file backends
//! - [`manager`] - the cart operations themselves
//! - [`config`] - environment-driven configuration
//! - [`error`] - `CartError` and the shopper-facing notification text
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::{CartConfig, CartManager, FileSlot, HttpCatalog};
//!
//! let config = CartConfig::from_env()?;
//! let catalog = HttpCatalog::new(&config.catalog);
//! let slot = FileSlot::new(&config.storage.path);
//! let mut cart = CartManager::new(catalog, slot, config.storage.key.clone());
//!
//! cart.add_product(ProductId::new(1)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod manager;
pub mod storage;

pub use catalog::{CatalogError, CatalogService, HttpCatalog};
pub use config::{CartConfig, CatalogConfig, ConfigError, StorageConfig};
pub use error::{CartError, FailureReason, Operation};
pub use manager::{AmountUpdate, CartManager, DEFAULT_STORAGE_KEY, UpdateProductAmount};
pub use storage::{FileSlot, MemorySlot, PersistenceSlot, StorageError};
