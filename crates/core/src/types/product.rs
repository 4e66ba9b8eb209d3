//! Catalog records and cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::ProductId;

/// Product data as returned by the catalog's `products/{id}` endpoint.
///
/// Fields beyond the ones the cart reads are kept in `extra` so they survive
/// a persist/hydrate round trip unchanged. Only `id` and `price` are
/// required; a missing `title` or `image` reads as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog product ID.
    pub id: ProductId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Unit price.
    pub price: Decimal,
    /// Image URL.
    #[serde(default)]
    pub image: String,
    /// Any other fields the catalog sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stock level as returned by the catalog's `stock/{id}` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInfo {
    /// Catalog product ID.
    pub id: ProductId,
    /// Units available.
    pub amount: u32,
}

impl StockInfo {
    /// Whether one more unit fits on top of `in_cart` units already held.
    #[must_use]
    pub const fn allows_increment(&self, in_cart: u32) -> bool {
        self.amount > in_cart
    }

    /// Whether `requested` units can be held in total.
    #[must_use]
    pub const fn covers(&self, requested: u32) -> bool {
        self.amount >= requested
    }
}

/// JSON key that holds a line item's quantity.
const AMOUNT_FIELD: &str = "amount";

/// A product in the cart together with its quantity.
///
/// Serializes flat: `{"id": 1, "title": "...", "price": "179.9", "image": "...", "amount": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product this line refers to.
    #[serde(flatten)]
    pub product: Product,
    /// Quantity in the cart, always at least 1.
    pub amount: u32,
}

impl LineItem {
    /// Create a line item holding a single unit of `product`.
    ///
    /// An `amount` the catalog sent among the product fields is dropped; the
    /// line's own amount replaces it.
    #[must_use]
    pub fn first_unit(mut product: Product) -> Self {
        product.extra.remove(AMOUNT_FIELD);
        Self { product, amount: 1 }
    }

    /// The product ID of this line.
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times quantity, or `None` if that overflows a `Decimal`.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.product.price.checked_mul(Decimal::from(self.amount))
    }
}
