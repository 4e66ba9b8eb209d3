//! Ordered cart snapshot.
//!
//! A [`Cart`] is an ordered sequence of [`LineItem`]s with unique product IDs.
//! Insertion order is display order. It serializes as a bare JSON array,
//! which is the blob the cart manager persists.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::product::LineItem;

/// Errors from operations that would break a cart invariant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartInvariantError {
    /// A line item with this product ID is already in the cart.
    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),
    /// A line item would hold zero units.
    #[error("product {0} must have an amount of at least 1")]
    ZeroAmount(ProductId),
}

/// An ordered sequence of line items, unique by product ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line items, rejecting duplicates and zero amounts.
    ///
    /// # Errors
    ///
    /// Returns [`CartInvariantError::DuplicateItem`] if two items share a product ID,
    /// or [`CartInvariantError::ZeroAmount`] if an item holds no units.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, CartInvariantError> {
        let mut cart = Self::new();
        for item in items {
            cart.push(item)?;
        }
        Ok(cart)
    }

    /// Append a line item at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is already present or the amount is 0.
    pub fn push(&mut self, item: LineItem) -> Result<(), CartInvariantError> {
        if item.amount == 0 {
            return Err(CartInvariantError::ZeroAmount(item.id()));
        }
        if self.contains(item.id()) {
            return Err(CartInvariantError::DuplicateItem(item.id()));
        }
        self.items.push(item);
        Ok(())
    }

    /// Set the amount of an existing line item.
    ///
    /// Returns `Ok(false)` when the product is not in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartInvariantError::ZeroAmount`] if `amount` is 0.
    pub fn set_amount(&mut self, id: ProductId, amount: u32) -> Result<bool, CartInvariantError> {
        if amount == 0 {
            return Err(CartInvariantError::ZeroAmount(id));
        }
        Ok(self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .map(|item| item.amount = amount)
            .is_some())
    }

    /// Remove a line item, preserving the order of the rest.
    pub fn remove(&mut self, id: ProductId) -> Option<LineItem> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Look up a line item by product ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether a product is in the cart.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate line items in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Line items in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct products.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all amounts.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.amount)).sum()
    }

    /// Price times amount for one product.
    ///
    /// `None` if the product is absent or its subtotal overflows a `Decimal`.
    #[must_use]
    pub fn subtotal(&self, id: ProductId) -> Option<Decimal> {
        self.get(id).and_then(LineItem::subtotal)
    }

    /// Sum of every line's subtotal, or `None` on `Decimal` overflow.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.subtotal()?))
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<LineItem>::deserialize(deserializer)?;
        Self::from_items(items).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
