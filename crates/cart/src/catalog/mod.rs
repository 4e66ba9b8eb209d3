//! Catalog Service: product and stock lookups.
//!
//! # Architecture
//!
//! - [`CatalogService`] is the seam the cart manager depends on
//! - [`HttpCatalog`] implements it over the REST catalog with `reqwest`
//! - Product lookups are cached via `moka` (configurable TTL)
//! - Stock lookups are never cached, every call goes to the API
//!
//! # Endpoints
//!
//! - `GET {base}/stock/{id}` returns `{ "id": 1, "amount": 3 }`
//! - `GET {base}/products/{id}` returns the product object
//!
//! # Example
//!
//! ```rust,ignore
//! use rocketshoes_cart::catalog::{CatalogService, HttpCatalog};
//!
//! let catalog = HttpCatalog::new(&config.catalog);
//! let stock = catalog.stock(ProductId::new(1)).await?;
//! ```

mod http;

use std::future::Future;

use rocketshoes_core::{Product, ProductId, StockInfo};
use thiserror::Error;

pub use http::HttpCatalog;

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Non-success status other than 404/429.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// First bytes of the response body.
        body: String,
    },
}

/// Product and stock lookups the cart manager needs.
pub trait CatalogService: Send + Sync {
    /// Fetch current stock for a product.
    fn stock(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<StockInfo, CatalogError>> + Send;

    /// Fetch full product data.
    fn product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Product, CatalogError>> + Send;
}
