//! # Storefront
//!
//! Wires the cart and wishlist stores into an application:
//!
//! - [`StorefrontConfig`]: environment-driven configuration
//! - [`FileStorage`]: durable storage as one JSON file per key
//! - [`CommerceProvider`]: mounts and hydrates both stores into a root scope
//!
//! Consumers reach the stores with [`commerce_cart::use_cart`] and
//! [`commerce_wishlist::use_wishlist`] on any scope below the provider.

pub mod config;
pub mod provider;
pub mod storage;

pub use config::{ConfigError, StorefrontConfig};
pub use provider::CommerceProvider;
pub use storage::FileStorage;
