//! Application-root wiring of the commerce stores.
//!
//! [`CommerceProvider`] owns the root [`Scope`]. Mounting it builds the
//! cart and the wishlist over one storage backend, hydrates both, and
//! provides them (together with the display locale) to every descendant
//! scope.

use crate::config::StorefrontConfig;
use commerce_cart::Cart;
use commerce_state_core::catalog::Locale;
use commerce_state_core::environment::DurableStorage;
use commerce_state_runtime::Scope;
use commerce_wishlist::Wishlist;
use std::sync::Arc;

/// Root of the storefront's context tree
#[derive(Debug, Clone)]
pub struct CommerceProvider {
    scope: Scope,
}

impl CommerceProvider {
    /// Build, hydrate and provide both stores
    ///
    /// Returns once both stored snapshots have been loaded, so nothing a
    /// consumer does afterwards can race the initial load.
    #[tracing::instrument(skip_all, fields(cart_key = %config.cart_key, wishlist_key = %config.wishlist_key))]
    pub async fn mount(config: &StorefrontConfig, storage: Arc<dyn DurableStorage>) -> Self {
        let (cart, wishlist) = tokio::join!(
            Cart::mount(Arc::clone(&storage), config.cart_persistence()),
            Wishlist::mount(storage, config.wishlist_persistence()),
        );

        let scope = Scope::root();
        scope.provide(cart);
        scope.provide(wishlist);
        scope.provide(config.locale);

        tracing::info!("Commerce stores mounted");
        Self { scope }
    }

    /// The root scope
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// A new scope below the root, e.g. for one page or component
    #[must_use]
    pub fn child(&self) -> Scope {
        self.scope.child()
    }

    /// Locale provided at mount
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.scope.get::<Locale>().map_or(Locale::En, |locale| *locale)
    }
}
