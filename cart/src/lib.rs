//! # Cart
//!
//! The shopper's cart: an ordered list of line items kept in the client,
//! persisted to durable storage after every change and restored once at
//! startup.
//!
//! - **Types**: [`CartLineItem`], [`VariantSelection`], [`LineId`], [`CartState`], [`CartAction`]
//! - **Reducer**: [`CartReducer`], the only place cart mutation happens
//! - **Facade**: [`Cart`], obtained from a scope with [`use_cart`]
//!
//! ## Example
//!
//! ```no_run
//! use commerce_cart::{Cart, CartLineItem};
//! use commerce_state_runtime::{MemoryStorage, PersistenceConfig};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let storage = Arc::new(MemoryStorage::new());
//! let cart = Cart::mount(storage, PersistenceConfig::new("cart")).await;
//!
//! let shirt = CartLineItem::new("shirt", "Shirt", Decimal::from(100))
//!     .with_sale_price(Decimal::from(80))
//!     .with_variant("size", "M")
//!     .with_quantity(2);
//! cart.add_item(shirt).await;
//!
//! assert_eq!(cart.item_count().await, 2);
//! assert_eq!(cart.subtotal().await, Decimal::from(160));
//! # }
//! ```

pub mod facade;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use facade::{use_cart, Cart, CartStore, DEFAULT_CART_KEY};
pub use reducer::{CartEnvironment, CartReducer};
pub use types::{CartAction, CartLineItem, CartState, LineId, VariantSelection};
