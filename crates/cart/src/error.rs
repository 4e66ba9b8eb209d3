//! Cart operation errors.
//!
//! Every failed cart operation yields a [`CartError`]. The UI layer shows
//! [`CartError::notification`] to the shopper; the `Display` form carries the
//! details for logs.

use std::fmt;

use rocketshoes_core::{CartInvariantError, ProductId};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::storage::StorageError;

/// The cart operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `add_product`
    Add,
    /// `remove_product`
    Remove,
    /// `update_product_amount`
    Update,
}

impl Operation {
    /// Shopper-facing message for a failed operation of this kind.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Error adding product",
            Self::Remove => "Error removing product",
            Self::Update => "Error updating product quantity",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add product"),
            Self::Remove => write!(f, "remove product"),
            Self::Update => write!(f, "update product amount"),
        }
    }
}

/// Why an operation failed.
#[derive(Debug, Error)]
pub enum FailureReason {
    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Writing the new cart failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The catalog returned data that would break the cart.
    #[error(transparent)]
    Invariant(#[from] CartInvariantError),

    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// Error returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested total exceeds what is in stock.
    #[error(
        "requested quantity {requested} of product {product_id} exceeds stock of {available}"
    )]
    InsufficientStock {
        /// Product being changed.
        product_id: ProductId,
        /// Total amount the cart would hold.
        requested: u32,
        /// Units the catalog reports available.
        available: u32,
    },

    /// The operation could not be completed.
    #[error("{operation} failed: {reason}")]
    OperationFailed {
        /// Which operation failed.
        operation: Operation,
        /// Underlying cause.
        #[source]
        reason: FailureReason,
    },
}

impl CartError {
    /// Build an `OperationFailed` error.
    pub fn failed(operation: Operation, reason: impl Into<FailureReason>) -> Self {
        Self::OperationFailed {
            operation,
            reason: reason.into(),
        }
    }

    /// Shopper-facing notification text.
    #[must_use]
    pub fn notification(&self) -> &'static str {
        match self {
            Self::InsufficientStock { .. } => "Requested quantity is out of stock",
            Self::OperationFailed { operation, .. } => operation.failure_message(),
        }
    }

    /// Whether the failure was a stock check.
    #[must_use]
    pub const fn is_insufficient_stock(&self) -> bool {
        matches!(self, Self::InsufficientStock { .. })
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
