//! # Commerce State Testing
//!
//! Testing utilities and helpers for the storefront commerce state engine.
//!
//! This crate provides:
//! - Mock implementations of durable storage
//! - Test helpers (tracing setup)
//! - Property-based testing strategies
//! - A Given-When-Then builder and assertion helpers for reducers
//!
//! ## Example
//!
//! ```ignore
//! use commerce_state_testing::mocks::RecordingStorage;
//!
//! #[tokio::test]
//! async fn clear_cart_is_persisted() {
//!     let storage = Arc::new(RecordingStorage::new());
//!     let cart = Cart::mount(storage.clone(), PersistenceConfig::new("cart")).await;
//!
//!     cart.clear_cart().await;
//!
//!     assert_eq!(storage.last_value("cart").as_deref(), Some("[]"));
//! }
//! ```

use commerce_state_core::environment::{DurableStorage, StorageError};
use commerce_state_runtime::MemoryStorage;


pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of durable storage
pub mod mocks {
    use super::{DurableStorage, MemoryStorage, StorageError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, PoisonError};

    /// A call made against [`RecordingStorage`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum StorageCall {
        /// `get_item(key)`
        Get(String),
        /// `set_item(key, value)`, recorded even when the write failed
        Set(String, String),
        /// `remove_item(key)`
        Remove(String),
    }

    /// In-memory storage that records every call and can be told to fail writes
    ///
    /// # Example
    ///
    /// ```
    /// use commerce_state_testing::mocks::{RecordingStorage, StorageCall};
    /// use commerce_state_core::environment::DurableStorage;
    ///
    /// let storage = RecordingStorage::new();
    /// storage.set_item("cart", "[]").ok();
    /// assert_eq!(storage.set_calls("cart"), 1);
    /// ```
    #[derive(Debug, Default)]
    pub struct RecordingStorage {
        inner: MemoryStorage,
        calls: Mutex<Vec<StorageCall>>,
        fail_writes: AtomicBool,
    }

    impl RecordingStorage {
        /// Create empty recording storage
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create recording storage pre-seeded with one value
        #[must_use]
        pub fn seeded(key: &str, value: &str) -> Self {
            let storage = Self::new();
            storage.inner.insert(key, value);
            storage
        }

        /// Make every following `set_item` fail (or succeed again)
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// All calls made so far, in order
        #[must_use]
        pub fn calls(&self) -> Vec<StorageCall> {
            self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Number of `set_item` calls for `key`
        #[must_use]
        pub fn set_calls(&self, key: &str) -> usize {
            self.calls()
                .iter()
                .filter(|call| matches!(call, StorageCall::Set(k, _) if k == key))
                .count()
        }

        /// Value currently stored under `key`
        #[must_use]
        pub fn last_value(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn record(&self, call: StorageCall) {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(call);
        }
    }

    impl DurableStorage for RecordingStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.record(StorageCall::Get(key.to_string()));
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.record(StorageCall::Set(key.to_string(), value.to_string()));
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                });
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.record(StorageCall::Remove(key.to_string()));
            self.inner.remove_item(key)
        }
    }

    /// Storage that is disabled entirely (private browsing, blocked cookies)
    #[derive(Debug, Default, Clone, Copy)]
    pub struct UnavailableStorage;

    impl DurableStorage for UnavailableStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("storage disabled".to_string()))
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a test-friendly tracing subscriber (once per process)
    ///
    /// Honours `RUST_LOG`; output goes through the test harness capture.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::collection::btree_map;
    use proptest::prelude::*;

    /// Variant type/value pairs with distinct types, in arbitrary order
    ///
    /// Pairs are shuffled so callers can check order independence.
    pub fn variant_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
        btree_map("[a-z]{1,8}", "[A-Za-z0-9 ]{1,8}", 0..4)
            .prop_map(|map| map.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    }

    /// Catalog-style product identifiers
    pub fn product_ids() -> impl Strategy<Value = String> {
        "prod-[a-z0-9]{1,6}"
    }

    /// Quantities a shopper can realistically add in one click
    pub fn quantities() -> impl Strategy<Value = u32> {
        1u32..=20
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{RecordingStorage, StorageCall, UnavailableStorage};
