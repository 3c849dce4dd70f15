//! Reducer logic for the wishlist store.

use crate::types::{WishlistAction, WishlistItem, WishlistState};
use commerce_state_core::{effect::Effect, reducer::Reducer, SmallVec};

/// Environment dependencies for the wishlist reducer (none)
#[derive(Clone, Copy, Debug, Default)]
pub struct WishlistEnvironment;

/// Reducer for the wishlist store
#[derive(Clone, Copy, Debug, Default)]
pub struct WishlistReducer;

impl WishlistReducer {
    /// Creates a new `WishlistReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add_item(state: &mut WishlistState, item: WishlistItem) {
        if state.is_in_wishlist(&item.product_id) {
            tracing::trace!(product = %item.product_id, "Already in wishlist");
            return;
        }
        state.items.push(item);
    }
}

impl Reducer for WishlistReducer {
    type State = WishlistState;
    type Action = WishlistAction;
    type Environment = WishlistEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            WishlistAction::Hydrate { items } => {
                state.items = items;
            },
            WishlistAction::AddItem { item } => Self::add_item(state, item),
            WishlistAction::RemoveItem { product_id } => {
                state.items.retain(|item| item.product_id != product_id);
            },
            WishlistAction::Toggle { item } => {
                if state.is_in_wishlist(&item.product_id) {
                    state.items.retain(|existing| existing.product_id != item.product_id);
                } else {
                    state.items.push(item);
                }
            },
            WishlistAction::ClearWishlist => state.items.clear(),
        }

        SmallVec::new()
    }
}
