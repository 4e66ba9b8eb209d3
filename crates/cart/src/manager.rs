//! The cart manager.
//!
//! [`CartManager`] owns the in-memory cart, checks quantities against the
//! catalog, and writes every new snapshot to the persistence slot.
//!
//! Each mutation builds the next [`Cart`] from a copy of the current one. The
//! copy is persisted first and only installed in memory once the write
//! succeeds, so a failed operation leaves memory and storage untouched.
//!
//! Mutations take `&mut self`, so two operations can never interleave across
//! a catalog fetch.

use rocketshoes_core::{Cart, LineItem, ProductId};
use tracing::{debug, instrument, warn};

use crate::catalog::CatalogService;
use crate::error::{CartError, FailureReason, Operation, Result};
use crate::storage::{PersistenceSlot, StorageError};

/// Key the cart blob is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

/// Request to set a line item to an exact amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateProductAmount {
    /// Product to change.
    pub product_id: ProductId,
    /// New amount. Zero or negative values are ignored.
    pub amount: i64,
}

/// What `update_product_amount` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountUpdate {
    /// The amount was changed and persisted.
    Updated,
    /// The requested amount was zero or negative; nothing was done.
    NonPositiveAmount,
    /// Stock allowed the amount but the product is not in the cart.
    NotInCart,
}

/// Shopping cart state bound to a catalog and a persistence slot.
#[derive(Debug)]
pub struct CartManager<C, S> {
    catalog: C,
    slot: S,
    key: String,
    cart: Cart,
}

impl<C: CatalogService, S: PersistenceSlot> CartManager<C, S> {
    /// Create a manager and hydrate the cart from `slot`.
    ///
    /// A missing, unreadable or malformed blob yields an empty cart.
    pub fn new(catalog: C, slot: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let cart = hydrate(&slot, &key);

        Self {
            catalog,
            slot,
            key,
            cart,
        }
    }

    /// Current cart snapshot.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The catalog this manager queries.
    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// The slot this manager persists to.
    #[must_use]
    pub const fn slot(&self) -> &S {
        &self.slot
    }

    /// Key the cart is stored under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart is incremented if stock holds more than
    /// the cart does. A new product is fetched and appended with amount 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] if stock is exhausted, or
    /// [`CartError::OperationFailed`] if a lookup or the write fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(&mut self, product_id: ProductId) -> Result<()> {
        self.try_add(product_id)
            .await
            .inspect_err(|e| warn!(error = %e, "Add to cart rejected"))
    }

    async fn try_add(&mut self, product_id: ProductId) -> Result<()> {
        let stock = self
            .catalog
            .stock(product_id)
            .await
            .map_err(|e| CartError::failed(Operation::Add, e))?;

        let mut next = self.cart.clone();

        if let Some(in_cart) = self.cart.get(product_id).map(|item| item.amount) {
            if !stock.allows_increment(in_cart) {
                return Err(CartError::InsufficientStock {
                    product_id,
                    requested: in_cart.saturating_add(1),
                    available: stock.amount,
                });
            }
            next.set_amount(product_id, in_cart.saturating_add(1))
                .map_err(|e| CartError::failed(Operation::Add, e))?;
        } else {
            let product = self
                .catalog
                .product(product_id)
                .await
                .map_err(|e| CartError::failed(Operation::Add, e))?;
            next.push(LineItem::first_unit(product))
                .map_err(|e| CartError::failed(Operation::Add, e))?;
        }

        self.commit(Operation::Add, next)
    }

    /// Remove a product entirely.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OperationFailed`] if the product is not in the
    /// cart or the write fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub fn remove_product(&mut self, product_id: ProductId) -> Result<()> {
        let mut next = self.cart.clone();
        if next.remove(product_id).is_none() {
            let err = CartError::failed(Operation::Remove, FailureReason::NotInCart(product_id));
            warn!(error = %err, "Remove from cart rejected");
            return Err(err);
        }

        self.commit(Operation::Remove, next)
            .inspect_err(|e| warn!(error = %e, "Remove from cart rejected"))
    }

    /// Set a product's amount exactly.
    ///
    /// Zero or negative amounts are ignored without contacting the catalog.
    /// A product that is not in the cart is left out; nothing is created.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] if stock is below `amount`,
    /// or [`CartError::OperationFailed`] if the lookup or the write fails.
    #[instrument(skip(self), fields(product_id = %request.product_id, amount = request.amount))]
    pub async fn update_product_amount(
        &mut self,
        request: UpdateProductAmount,
    ) -> Result<AmountUpdate> {
        self.try_update(request)
            .await
            .inspect_err(|e| warn!(error = %e, "Cart amount update rejected"))
    }

    async fn try_update(&mut self, request: UpdateProductAmount) -> Result<AmountUpdate> {
        let UpdateProductAmount { product_id, amount } = request;
        if amount <= 0 {
            debug!("Ignoring non-positive amount");
            return Ok(AmountUpdate::NonPositiveAmount);
        }
        // Anything past u32::MAX is beyond any stock level
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);

        let stock = self
            .catalog
            .stock(product_id)
            .await
            .map_err(|e| CartError::failed(Operation::Update, e))?;

        if !stock.covers(amount) {
            return Err(CartError::InsufficientStock {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        }

        let mut next = self.cart.clone();
        let found = next
            .set_amount(product_id, amount)
            .map_err(|e| CartError::failed(Operation::Update, e))?;
        if !found {
            debug!("Product not in cart, nothing to update");
            return Ok(AmountUpdate::NotInCart);
        }

        self.commit(Operation::Update, next)?;
        Ok(AmountUpdate::Updated)
    }

    /// Persist `next` and install it as the current cart.
    fn commit(&mut self, operation: Operation, next: Cart) -> Result<()> {
        let blob = serde_json::to_string(&next)
            .map_err(|e| CartError::failed(operation, StorageError::from(e)))?;
        self.slot
            .set(&self.key, &blob)
            .map_err(|e| CartError::failed(operation, e))?;

        debug!(
            items = next.len(),
            quantity = next.total_quantity(),
            "Cart persisted"
        );
        self.cart = next;
        Ok(())
    }
}

/// Read the stored cart, falling back to empty on any problem.
fn hydrate<S: PersistenceSlot>(slot: &S, key: &str) -> Cart {
    let blob = match slot.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(key, error = %e, "Could not read stored cart, starting empty");
            return Cart::new();
        }
    };

    serde_json::from_str(&blob).unwrap_or_else(|e| {
        warn!(key, error = %e, "Stored cart is malformed, starting empty");
        Cart::new()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use rocketshoes_core::{Product, StockInfo};
    use rust_decimal::Decimal;
    use serde_json::Map;

    use super::*;
    use crate::catalog::CatalogError;
    use crate::storage::MemorySlot;

    #[derive(Default)]
    struct FakeCatalog {
        stock: Mutex<HashMap<ProductId, u32>>,
        product_calls: Mutex<u32>,
        stock_calls: Mutex<u32>,
        fail_products: bool,
    }

    impl FakeCatalog {
        fn with_stock(pairs: &[(i32, u32)]) -> Self {
            let catalog = Self::default();
            for &(id, amount) in pairs {
                catalog.set_stock(id, amount);
            }
            catalog
        }

        fn set_stock(&self, id: i32, amount: u32) {
            self.stock
                .lock()
                .unwrap()
                .insert(ProductId::new(id), amount);
        }

        fn stock_calls(&self) -> u32 {
            *self.stock_calls.lock().unwrap()
        }

        fn product_calls(&self) -> u32 {
            *self.product_calls.lock().unwrap()
        }
    }

    fn product(id: ProductId) -> Product {
        Product {
            id,
            title: format!("Shoe {id}"),
            price: Decimal::new(1799, 1),
            image: format!("https://cdn.example.com/{id}.jpg"),
            extra: Map::new(),
        }
    }

    impl CatalogService for FakeCatalog {
        async fn stock(&self, id: ProductId) -> std::result::Result<StockInfo, CatalogError> {
            *self.stock_calls.lock().unwrap() += 1;
            let amount = self
                .stock
                .lock()
                .unwrap()
                .get(&id)
                .copied()
                .ok_or_else(|| CatalogError::NotFound(format!("stock/{id}")))?;
            Ok(StockInfo { id, amount })
        }

        async fn product(&self, id: ProductId) -> std::result::Result<Product, CatalogError> {
            *self.product_calls.lock().unwrap() += 1;
            if self.fail_products {
                return Err(CatalogError::Status {
                    status: 500,
                    body: "down".to_string(),
                });
            }
            Ok(product(id))
        }
    }

    struct BrokenSlot;

    impl PersistenceSlot for BrokenSlot {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Poisoned)
        }
    }

    type TestManager = CartManager<FakeCatalog, Arc<MemorySlot>>;

    fn manager(stock: &[(i32, u32)]) -> (TestManager, Arc<MemorySlot>) {
        let slot = Arc::new(MemorySlot::new());
        let manager = CartManager::new(
            FakeCatalog::with_stock(stock),
            Arc::clone(&slot),
            DEFAULT_STORAGE_KEY,
        );
        (manager, slot)
    }

    fn stored(slot: &MemorySlot) -> Cart {
        serde_json::from_str(&slot.get(DEFAULT_STORAGE_KEY).unwrap().unwrap()).unwrap()
    }

    fn amounts(cart: &Cart) -> Vec<(i32, u32)> {
        cart.iter().map(|i| (i.id().as_i32(), i.amount)).collect()
    }

    fn id(n: i32) -> ProductId {
        ProductId::new(n)
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    #[test]
    fn test_hydrate_empty_slot() {
        let (manager, _) = manager(&[]);
        assert!(manager.cart().is_empty());
    }

    #[test]
    fn test_hydrate_existing_cart() {
        let json = r#"[{"id": 2, "title": "Boot", "price": "99.90", "image": "b.jpg", "amount": 3}]"#;
        let slot = MemorySlot::with_value(DEFAULT_STORAGE_KEY, json);
        let manager = CartManager::new(FakeCatalog::default(), slot, DEFAULT_STORAGE_KEY);

        assert_eq!(amounts(manager.cart()), vec![(2, 3)]);
    }

    #[test]
    fn test_hydrate_malformed_blob_falls_back_to_empty() {
        let slot = MemorySlot::with_value(DEFAULT_STORAGE_KEY, "{not json");
        let manager = CartManager::new(FakeCatalog::default(), slot, DEFAULT_STORAGE_KEY);
        assert!(manager.cart().is_empty());
    }

    #[test]
    fn test_hydrate_uses_configured_key() {
        let json = r#"[{"id": 2, "title": "Boot", "price": 1, "image": "b.jpg", "amount": 1}]"#;
        let slot = MemorySlot::with_value("other", json);
        let manager = CartManager::new(FakeCatalog::default(), slot, DEFAULT_STORAGE_KEY);
        assert!(manager.cart().is_empty());
        assert_eq!(manager.storage_key(), DEFAULT_STORAGE_KEY);
    }

    // =========================================================================
    // add_product
    // =========================================================================

    #[tokio::test]
    async fn test_add_new_product() {
        let (mut manager, slot) = manager(&[(1, 5)]);

        manager.add_product(id(1)).await.unwrap();

        assert_eq!(amounts(manager.cart()), vec![(1, 1)]);
        assert_eq!(stored(&slot), *manager.cart());
        assert_eq!(manager.catalog().product_calls(), 1);
    }

    #[tokio::test]
    async fn test_add_existing_increments_without_refetching_product() {
        let (mut manager, slot) = manager(&[(1, 5)]);

        manager.add_product(id(1)).await.unwrap();
        manager.add_product(id(1)).await.unwrap();

        assert_eq!(amounts(manager.cart()), vec![(1, 2)]);
        assert_eq!(stored(&slot), *manager.cart());
        assert_eq!(manager.catalog().product_calls(), 1);
        assert_eq!(manager.catalog().stock_calls(), 2);
    }

    #[tokio::test]
    async fn test_add_requires_stock_strictly_greater() {
        let (mut manager, slot) = manager(&[(1, 2)]);
        manager.add_product(id(1)).await.unwrap();
        manager.add_product(id(1)).await.unwrap();

        let err = manager.add_product(id(1)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
        assert_eq!(amounts(manager.cart()), vec![(1, 2)]);
        assert_eq!(amounts(&stored(&slot)), vec![(1, 2)]);
    }

    #[tokio::test]
    async fn test_add_with_zero_stock_still_adds_first_unit() {
        // Only an existing line is checked against stock
        let (mut manager, _) = manager(&[(1, 0)]);
        manager.add_product(id(1)).await.unwrap();
        assert_eq!(amounts(manager.cart()), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_add_appends_in_order() {
        let (mut manager, _) = manager(&[(1, 5), (2, 5), (3, 5)]);
        manager.add_product(id(3)).await.unwrap();
        manager.add_product(id(1)).await.unwrap();
        manager.add_product(id(2)).await.unwrap();

        assert_eq!(amounts(manager.cart()), vec![(3, 1), (1, 1), (2, 1)]);
    }

    #[tokio::test]
    async fn test_add_unknown_product_fails() {
        let (mut manager, slot) = manager(&[]);

        let err = manager.add_product(id(9)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::OperationFailed {
                operation: Operation::Add,
                reason: FailureReason::Catalog(CatalogError::NotFound(_)),
            }
        ));
        assert_eq!(err.notification(), "Error adding product");
        assert!(manager.cart().is_empty());
        assert_eq!(slot.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_product_fetch_failure_leaves_cart() {
        let slot = Arc::new(MemorySlot::new());
        let catalog = FakeCatalog {
            fail_products: true,
            ..FakeCatalog::with_stock(&[(1, 5)])
        };
        let mut manager = CartManager::new(catalog, Arc::clone(&slot), DEFAULT_STORAGE_KEY);

        let err = manager.add_product(id(1)).await.unwrap_err();

        assert_eq!(err.notification(), "Error adding product");
        assert!(manager.cart().is_empty());
        assert_eq!(slot.get(DEFAULT_STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_cart() {
        let mut manager = CartManager::new(
            FakeCatalog::with_stock(&[(1, 5)]),
            BrokenSlot,
            DEFAULT_STORAGE_KEY,
        );

        let err = manager.add_product(id(1)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::OperationFailed {
                reason: FailureReason::Storage(_),
                ..
            }
        ));
        assert!(manager.cart().is_empty());
    }

    // =========================================================================
    // remove_product
    // =========================================================================

    #[tokio::test]
    async fn test_remove_product_preserves_order() {
        let (mut manager, slot) = manager(&[(1, 5), (2, 5), (3, 5)]);
        for n in 1..=3 {
            manager.add_product(id(n)).await.unwrap();
        }

        manager.remove_product(id(2)).unwrap();

        assert_eq!(amounts(manager.cart()), vec![(1, 1), (3, 1)]);
        assert_eq!(stored(&slot), *manager.cart());
    }

    #[tokio::test]
    async fn test_remove_absent_product_fails() {
        let (mut manager, slot) = manager(&[(1, 5)]);
        manager.add_product(id(1)).await.unwrap();
        let before = slot.get(DEFAULT_STORAGE_KEY).unwrap();

        let err = manager.remove_product(id(7)).unwrap_err();

        assert!(matches!(
            err,
            CartError::OperationFailed {
                operation: Operation::Remove,
                reason: FailureReason::NotInCart(_),
            }
        ));
        assert_eq!(err.notification(), "Error removing product");
        assert_eq!(amounts(manager.cart()), vec![(1, 1)]);
        assert_eq!(slot.get(DEFAULT_STORAGE_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn test_remove_last_item_persists_empty_cart() {
        let (mut manager, slot) = manager(&[(1, 5)]);
        manager.add_product(id(1)).await.unwrap();

        manager.remove_product(id(1)).unwrap();

        assert!(manager.cart().is_empty());
        assert_eq!(slot.get(DEFAULT_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    // =========================================================================
    // update_product_amount
    // =========================================================================

    fn update(n: i32, amount: i64) -> UpdateProductAmount {
        UpdateProductAmount {
            product_id: id(n),
            amount,
        }
    }

    #[tokio::test]
    async fn test_update_non_positive_is_noop() {
        let (mut manager, slot) = manager(&[(1, 5)]);
        manager.add_product(id(1)).await.unwrap();
        let calls = manager.catalog().stock_calls();

        for amount in [0, -1, i64::MIN] {
            let outcome = manager.update_product_amount(update(1, amount)).await.unwrap();
            assert_eq!(outcome, AmountUpdate::NonPositiveAmount);
        }

        assert_eq!(amounts(manager.cart()), vec![(1, 1)]);
        assert_eq!(amounts(&stored(&slot)), vec![(1, 1)]);
        assert_eq!(manager.catalog().stock_calls(), calls);
    }

    #[tokio::test]
    async fn test_update_allows_exact_stock() {
        let (mut manager, slot) = manager(&[(1, 5)]);
        manager.add_product(id(1)).await.unwrap();

        let outcome = manager.update_product_amount(update(1, 5)).await.unwrap();

        assert_eq!(outcome, AmountUpdate::Updated);
        assert_eq!(amounts(manager.cart()), vec![(1, 5)]);
        assert_eq!(stored(&slot), *manager.cart());
    }

    #[tokio::test]
    async fn test_update_can_decrease() {
        let (mut manager, _) = manager(&[(1, 5)]);
        manager.add_product(id(1)).await.unwrap();
        manager.update_product_amount(update(1, 4)).await.unwrap();

        manager.update_product_amount(update(1, 2)).await.unwrap();

        assert_eq!(amounts(manager.cart()), vec![(1, 2)]);
    }

    #[tokio::test]
    async fn test_update_beyond_stock_fails() {
        let (mut manager, slot) = manager(&[(1, 5)]);
        manager.add_product(id(1)).await.unwrap();

        let err = manager.update_product_amount(update(1, 6)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
        assert_eq!(err.notification(), "Requested quantity is out of stock");
        assert_eq!(amounts(manager.cart()), vec![(1, 1)]);
        assert_eq!(amounts(&stored(&slot)), vec![(1, 1)]);
    }

    #[tokio::test]
    async fn test_update_huge_amount_is_stock_error() {
        let (mut manager, _) = manager(&[(1, 5)]);
        manager.add_product(id(1)).await.unwrap();

        let err = manager
            .update_product_amount(update(1, i64::MAX))
            .await
            .unwrap_err();

        assert!(err.is_insufficient_stock());
    }

    #[tokio::test]
    async fn test_update_absent_product_is_silent() {
        let (mut manager, slot) = manager(&[(1, 5), (2, 5)]);
        manager.add_product(id(1)).await.unwrap();
        let before = slot.get(DEFAULT_STORAGE_KEY).unwrap();

        let outcome = manager.update_product_amount(update(2, 3)).await.unwrap();

        assert_eq!(outcome, AmountUpdate::NotInCart);
        assert_eq!(amounts(manager.cart()), vec![(1, 1)]);
        assert_eq!(slot.get(DEFAULT_STORAGE_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_absent_product_still_checks_stock() {
        let (mut manager, _) = manager(&[(2, 1)]);

        let err = manager.update_product_amount(update(2, 3)).await.unwrap_err();

        assert!(err.is_insufficient_stock());
    }

    #[tokio::test]
    async fn test_update_stock_failure() {
        let (mut manager, _) = manager(&[]);

        let err = manager.update_product_amount(update(1, 2)).await.unwrap_err();

        assert!(matches!(
            err,
            CartError::OperationFailed {
                operation: Operation::Update,
                ..
            }
        ));
        assert_eq!(err.notification(), "Error updating product quantity");
    }

    #[tokio::test]
    async fn test_stock_changes_between_operations_are_seen() {
        let (mut manager, _) = manager(&[(1, 1)]);
        manager.add_product(id(1)).await.unwrap();
        assert!(manager.add_product(id(1)).await.is_err());

        manager.catalog().set_stock(1, 3);
        manager.add_product(id(1)).await.unwrap();

        assert_eq!(amounts(manager.cart()), vec![(1, 2)]);
    }
}
