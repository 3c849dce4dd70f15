//! The cart as UI code sees it.
//!
//! [`Cart`] wraps a persisted [`Store`] and exposes the shopper-facing
//! operations plus derived totals. Consumers obtain it from a [`Scope`] with
//! [`use_cart`] rather than through a global.

use crate::reducer::{CartEnvironment, CartReducer};
use crate::types::{CartAction, CartLineItem, CartState, LineId};
use commerce_state_core::catalog::ProductId;
use commerce_state_core::environment::DurableStorage;
use commerce_state_runtime::{Persistence, PersistenceConfig, Scope, Store, StoreError};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;

/// Store type backing the cart
pub type CartStore = Store<CartState, CartAction, CartEnvironment, CartReducer>;

/// Storage key used when none is configured
pub const DEFAULT_CART_KEY: &str = "cart";

/// Handle to the shopper's cart
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct Cart {
    store: CartStore,
}

impl Cart {
    /// Wraps an existing store
    #[must_use]
    pub const fn new(store: CartStore) -> Self {
        Self { store }
    }

    /// Creates a cart persisted under `config.storage_key` and hydrates it
    ///
    /// Once this returns, the stored cart (if any) has been loaded and every
    /// later mutation is written back.
    pub async fn mount(storage: Arc<dyn DurableStorage>, config: PersistenceConfig) -> Self {
        tracing::debug!(key = %config.storage_key, "Mounting cart store");
        let store = Store::with_persistence(
            CartState::new(),
            CartReducer::new(),
            CartEnvironment,
            Persistence::<CartLineItem>::new(storage, config),
        );
        let _ = store.hydrate().await;
        Self { store }
    }

    /// Creates a cart that lives only in memory
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new(Store::new(CartState::new(), CartReducer::new(), CartEnvironment))
    }

    /// Snapshot of the lines in display order
    pub async fn items(&self) -> Vec<CartLineItem> {
        self.store.state(|s| s.items.clone()).await
    }

    /// Adds `item.quantity` units, merging into a matching line
    pub async fn add_item(&self, item: CartLineItem) {
        let _ = self.store.send(CartAction::AddItem { item }).await;
    }

    /// Drops the line with `id`, if present
    pub async fn remove_item(&self, id: &LineId) {
        let _ = self.store.send(CartAction::RemoveItem { id: id.clone() }).await;
    }

    /// Sets a line's quantity; zero or less removes it
    pub async fn update_quantity(&self, id: &LineId, quantity: i64) {
        let _ = self
            .store
            .send(CartAction::UpdateQuantity {
                id: id.clone(),
                quantity,
            })
            .await;
    }

    /// Empties the cart
    pub async fn clear_cart(&self) {
        let _ = self.store.send(CartAction::ClearCart).await;
    }

    /// Total units across lines
    pub async fn item_count(&self) -> u64 {
        self.store.state(CartState::item_count).await
    }

    /// Sum of `(sale price or base price) * quantity`
    pub async fn subtotal(&self) -> Decimal {
        self.store.state(CartState::subtotal).await
    }

    /// Total discount from sale prices
    pub async fn savings(&self) -> Decimal {
        self.store.state(CartState::savings).await
    }

    /// Line with `id`
    pub async fn line(&self, id: &LineId) -> Option<CartLineItem> {
        self.store.state(|s| s.line(id).cloned()).await
    }

    /// Whether any variant of `product_id` is in the cart
    pub async fn contains_product(&self, product_id: &ProductId) -> bool {
        self.store.state(|s| s.contains_product(product_id)).await
    }

    /// Units of `product_id` across its variant lines
    pub async fn quantity_of(&self, product_id: &ProductId) -> u64 {
        self.store.state(|s| s.quantity_of(product_id)).await
    }

    /// Change notifications; the value is the store revision
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &CartStore {
        &self.store
    }
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("revision", &self.store.revision())
            .finish_non_exhaustive()
    }
}

/// Cart mounted in `scope` or one of its ancestors
///
/// # Errors
///
/// Returns [`StoreError::OutsideScope`] when no provider mounted a cart
/// above `scope`.
pub fn use_cart(scope: &Scope) -> Result<Arc<Cart>, StoreError> {
    scope.require::<Cart>()
}
