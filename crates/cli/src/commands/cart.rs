//! Cart mutation commands.
//!
//! # Usage
//!
//! ```bash
//! # Add one unit of product 1
//! rs-cart add 1
//!
//! # Set product 1 to exactly 3 units
//! rs-cart update 1 3
//!
//! # Remove product 1
//! rs-cart remove 1
//! ```

use rocketshoes_cart::{
    AmountUpdate, CartError, CartManager, CatalogService, PersistenceSlot, UpdateProductAmount,
};
use rocketshoes_core::ProductId;
use tracing::info;

/// A cart operation requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    /// Add one unit.
    Add(ProductId),
    /// Remove the line entirely.
    Remove(ProductId),
    /// Set an exact amount.
    Update {
        /// Product to change.
        product_id: ProductId,
        /// Requested amount.
        amount: i64,
    },
}

/// Apply `action` to the cart.
///
/// # Errors
///
/// Returns the cart's error unchanged; the caller decides how to show it.
pub async fn apply<C, S>(manager: &mut CartManager<C, S>, action: CartAction) -> Result<(), CartError>
where
    C: CatalogService,
    S: PersistenceSlot,
{
    match action {
        CartAction::Add(product_id) => {
            manager.add_product(product_id).await?;
            info!(%product_id, "Product added");
        }
        CartAction::Remove(product_id) => {
            manager.remove_product(product_id)?;
            info!(%product_id, "Product removed");
        }
        CartAction::Update { product_id, amount } => {
            let outcome = manager
                .update_product_amount(UpdateProductAmount { product_id, amount })
                .await?;
            if outcome == AmountUpdate::Updated {
                info!(%product_id, amount, "Product amount updated");
            }
        }
    }
    Ok(())
}
