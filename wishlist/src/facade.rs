//! Wishlist facade and scope lookup.

use crate::reducer::{WishlistEnvironment, WishlistReducer};
use crate::types::{WishlistAction, WishlistItem, WishlistState};
use commerce_state_core::catalog::ProductId;
use commerce_state_core::environment::DurableStorage;
use commerce_state_runtime::{Persistence, PersistenceConfig, Scope, Store, StoreError};
use std::sync::Arc;
use tokio::sync::watch;

/// Store type backing the wishlist
pub type WishlistStore = Store<WishlistState, WishlistAction, WishlistEnvironment, WishlistReducer>;

/// Storage key used when none is configured
pub const DEFAULT_WISHLIST_KEY: &str = "wishlist";

/// Handle to the shopper's wishlist
#[derive(Clone)]
pub struct Wishlist {
    store: WishlistStore,
}

impl Wishlist {
    /// Wraps an existing store
    #[must_use]
    pub const fn new(store: WishlistStore) -> Self {
        Self { store }
    }

    /// Creates a wishlist persisted under `config.storage_key` and hydrates it
    pub async fn mount(storage: Arc<dyn DurableStorage>, config: PersistenceConfig) -> Self {
        tracing::debug!(key = %config.storage_key, "Mounting wishlist store");
        let store = Store::with_persistence(
            WishlistState::new(),
            WishlistReducer::new(),
            WishlistEnvironment,
            Persistence::<WishlistItem>::new(storage, config),
        );
        let _ = store.hydrate().await;
        Self { store }
    }

    /// Creates a wishlist that lives only in memory
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new(Store::new(
            WishlistState::new(),
            WishlistReducer::new(),
            WishlistEnvironment,
        ))
    }

    /// Snapshot of the saved products
    pub async fn items(&self) -> Vec<WishlistItem> {
        self.store.state(|s| s.items.clone()).await
    }

    /// Saves a product (no-op when already saved)
    pub async fn add_item(&self, item: WishlistItem) {
        let _ = self.store.send(WishlistAction::AddItem { item }).await;
    }

    /// Forgets a product
    pub async fn remove_item(&self, product_id: &ProductId) {
        let _ = self
            .store
            .send(WishlistAction::RemoveItem {
                product_id: product_id.clone(),
            })
            .await;
    }

    /// Saves the product if absent, forgets it otherwise
    pub async fn toggle(&self, item: WishlistItem) {
        let _ = self.store.send(WishlistAction::Toggle { item }).await;
    }

    /// Forgets everything
    pub async fn clear(&self) {
        let _ = self.store.send(WishlistAction::ClearWishlist).await;
    }

    /// Whether `product_id` is saved
    pub async fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.store.state(|s| s.is_in_wishlist(product_id)).await
    }

    /// Number of saved products
    pub async fn count(&self) -> usize {
        self.store.state(WishlistState::count).await
    }

    /// Change notifications; the value is the store revision
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &WishlistStore {
        &self.store
    }
}

impl std::fmt::Debug for Wishlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wishlist")
            .field("revision", &self.store.revision())
            .finish_non_exhaustive()
    }
}

/// Wishlist mounted in `scope` or one of its ancestors
///
/// # Errors
///
/// Returns [`StoreError::OutsideScope`] when no provider mounted a wishlist
/// above `scope`.
pub fn use_wishlist(scope: &Scope) -> Result<Arc<Wishlist>, StoreError> {
    scope.require::<Wishlist>()
}
