//! # Wishlist
//!
//! Products the shopper saved for later. Membership is keyed by product id;
//! saving a product twice keeps the first snapshot. Persisted and hydrated
//! the same way as the cart.
//!
//! ## Example
//!
//! ```no_run
//! use commerce_state_core::catalog::ProductId;
//! use commerce_wishlist::{Wishlist, WishlistItem};
//! use rust_decimal::Decimal;
//!
//! # async fn example() {
//! let wishlist = Wishlist::ephemeral();
//! wishlist.toggle(WishlistItem::new("saree", "Saree", Decimal::from(1500))).await;
//!
//! assert!(wishlist.is_in_wishlist(&ProductId::new("saree")).await);
//! # }
//! ```

pub mod facade;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use facade::{use_wishlist, Wishlist, WishlistStore, DEFAULT_WISHLIST_KEY};
pub use reducer::{WishlistEnvironment, WishlistReducer};
pub use types::{WishlistAction, WishlistItem, WishlistState};
