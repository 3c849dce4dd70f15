//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.

use commerce_cart::DEFAULT_CART_KEY;
use commerce_state_core::catalog::{Locale, UnknownLocale};
use commerce_state_runtime::PersistenceConfig;
use commerce_wishlist::DEFAULT_WISHLIST_KEY;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `STOREFRONT_LOCALE` is not a supported locale
    #[error(transparent)]
    Locale(#[from] UnknownLocale),

    /// A storage key is blank
    #[error("{variable} must not be empty")]
    EmptyKey {
        /// Environment variable holding the key
        variable: &'static str,
    },

    /// Cart and wishlist would overwrite each other
    #[error("Cart and wishlist cannot share the storage key '{0}'")]
    SharedKey(String),
}

/// Storefront configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Directory holding one file per storage key
    pub storage_dir: PathBuf,
    /// Storage key of the cart snapshot
    pub cart_key: String,
    /// Storage key of the wishlist snapshot
    pub wishlist_key: String,
    /// Display language for product names
    pub locale: Locale,
    /// Install the Prometheus recorder and print a snapshot on exit
    pub metrics_enabled: bool,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".storefront"),
            cart_key: DEFAULT_CART_KEY.to_string(),
            wishlist_key: DEFAULT_WISHLIST_KEY.to_string(),
            locale: Locale::En,
            metrics_enabled: false,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `STOREFRONT_STORAGE_DIR` | `.storefront` |
    /// | `STOREFRONT_CART_KEY` | `cart` |
    /// | `STOREFRONT_WISHLIST_KEY` | `wishlist` |
    /// | `STOREFRONT_LOCALE` | `en` |
    /// | `STOREFRONT_METRICS` | `false` |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            storage_dir: lookup("STOREFRONT_STORAGE_DIR")
                .map_or(defaults.storage_dir, PathBuf::from),
            cart_key: lookup("STOREFRONT_CART_KEY").unwrap_or(defaults.cart_key),
            wishlist_key: lookup("STOREFRONT_WISHLIST_KEY").unwrap_or(defaults.wishlist_key),
            locale: lookup("STOREFRONT_LOCALE")
                .map(|s| s.parse::<Locale>())
                .transpose()?
                .unwrap_or(defaults.locale),
            metrics_enabled: lookup("STOREFRONT_METRICS")
                .map(|s| parse_flag(&s))
                .unwrap_or(defaults.metrics_enabled),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cart_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey {
                variable: "STOREFRONT_CART_KEY",
            });
        }
        if self.wishlist_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey {
                variable: "STOREFRONT_WISHLIST_KEY",
            });
        }
        if self.cart_key == self.wishlist_key {
            return Err(ConfigError::SharedKey(self.cart_key.clone()));
        }
        Ok(())
    }

    /// Persistence configuration for the cart store
    #[must_use]
    pub fn cart_persistence(&self) -> PersistenceConfig {
        PersistenceConfig::new(self.cart_key.clone())
    }

    /// Persistence configuration for the wishlist store
    #[must_use]
    pub fn wishlist_persistence(&self) -> PersistenceConfig {
        PersistenceConfig::new(self.wishlist_key.clone())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
