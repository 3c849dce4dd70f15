//! Reducer logic for the cart store.

use crate::types::{CartAction, CartLineItem, CartState, LineId};
use commerce_state_core::{effect::Effect, reducer::Reducer, SmallVec};

/// Environment dependencies for the cart reducer
///
/// The cart reducer is pure; it needs nothing injected.
#[derive(Clone, Copy, Debug, Default)]
pub struct CartEnvironment;

/// Reducer for the cart store
#[derive(Clone, Copy, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add_item(state: &mut CartState, mut item: CartLineItem) {
        if item.quantity == 0 {
            tracing::trace!(line = %item.id, "Ignoring add of zero units");
            return;
        }

        match state.items.iter_mut().find(|existing| existing.same_line_as(&item)) {
            // First-seen snapshot wins; only the quantity grows
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            },
            None => {
                // Stored id always follows product and variants
                item.id = LineId::for_selection(&item.product_id, &item.selected_variants);
                state.items.push(item);
            },
        }
    }

    fn remove_item(state: &mut CartState, id: &LineId) {
        state.items.retain(|item| &item.id != id);
    }

    fn update_quantity(state: &mut CartState, id: &LineId, quantity: i64) {
        if quantity <= 0 {
            Self::remove_item(state, id);
            return;
        }

        if let Some(item) = state.items.iter_mut().find(|item| &item.id == id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::Hydrate { items } => {
                state.items = items;
            },
            CartAction::AddItem { item } => Self::add_item(state, item),
            CartAction::RemoveItem { id } => Self::remove_item(state, &id),
            CartAction::UpdateQuantity { id, quantity } => {
                Self::update_quantity(state, &id, quantity);
            },
            CartAction::ClearCart => state.items.clear(),
        }

        SmallVec::new()
    }
}
