//! Persistence of store state to durable storage.
//!
//! Two pieces cooperate here:
//!
//! - [`PersistenceAdapter`] turns an item list into a JSON array under one
//!   storage key and back. Every failure is absorbed: a write that fails is
//!   dropped, a payload that cannot be read is treated as "nothing stored".
//! - [`HydrationGate`] keeps the adapter from writing before the stored
//!   snapshot has been read, so the empty initial state never overwrites it.
//!
//! [`Persistence`] bundles both and is what a [`Store`](crate::Store) is
//! constructed with.

use commerce_state_core::environment::DurableStorage;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Configuration for one persisted store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Storage key owned exclusively by the store
    pub storage_key: String,
}

impl PersistenceConfig {
    /// Create a configuration for the given storage key
    #[must_use]
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
        }
    }
}

/// State whose item list is written to durable storage
pub trait PersistedState: Send + Sync {
    /// Item type stored in the JSON array
    type Item: Serialize + DeserializeOwned + Send + Sync;

    /// Items in display order
    fn items(&self) -> &[Self::Item];
}

/// Action type that can replace a store's items wholesale
pub trait HydrateAction: Sized {
    /// Item type carried by the hydrate action
    type Item;

    /// Build the action that overwrites the state with `items`
    fn hydrate(items: Vec<Self::Item>) -> Self;
}

/// Outcome of reading the stored snapshot at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restored<A> {
    /// A valid snapshot was found; dispatch this action
    Snapshot(A),
    /// Nothing usable was stored
    Empty,
    /// Hydration already happened earlier
    AlreadyHydrated,
}

/// What a [`Store`](crate::Store) needs from its persistence layer
///
/// Both methods run while the store holds its state lock.
pub trait StatePersistence<S, A>: Send + Sync {
    /// Read the stored snapshot and mark the initial load as resolved
    fn restore(&self) -> Restored<A>;

    /// Called after every dispatch with the new state
    fn persist(&self, state: &S);
}

/// Phase of a [`HydrationGate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// The initial load has not resolved yet
    Loading,
    /// The load resolved; the next eligibility check opens the gate
    Loaded,
    /// Writes are allowed
    Hydrated,
}

const LOADING: u8 = 0;
const LOADED: u8 = 1;
const HYDRATED: u8 = 2;

/// One-shot latch that holds back persistence until hydration finished
///
/// ```text
/// Loading --mark_loaded()--> Loaded --should_persist()--> Hydrated
///             (false)                    (false)              (true ...)
/// ```
///
/// Checks made while `Loading` return `false` without advancing, so a
/// mutation dispatched before the load resolved is never written. The check
/// that moves the gate from `Loaded` to `Hydrated` also returns `false`: the
/// dispatch cycle that opens the gate does not write.
#[derive(Debug)]
pub struct HydrationGate {
    phase: AtomicU8,
}

impl HydrationGate {
    /// Create a gate in the `Loading` phase
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(LOADING),
        }
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> GatePhase {
        match self.phase.load(Ordering::Acquire) {
            LOADING => GatePhase::Loading,
            LOADED => GatePhase::Loaded,
            _ => GatePhase::Hydrated,
        }
    }

    /// Record that the initial load attempt resolved
    ///
    /// Returns `false` if the load had already been marked.
    pub fn mark_loaded(&self) -> bool {
        self.phase
            .compare_exchange(LOADING, LOADED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether the current dispatch cycle may write to storage
    pub fn should_persist(&self) -> bool {
        match self.phase.load(Ordering::Acquire) {
            LOADING => false,
            LOADED => {
                self.phase.store(HYDRATED, Ordering::Release);
                false
            },
            _ => true,
        }
    }
}

impl Default for HydrationGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and writes one item list under one storage key
pub struct PersistenceAdapter<T> {
    storage: Arc<dyn DurableStorage>,
    key: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> PersistenceAdapter<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create an adapter over `storage` for the configured key
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>, config: PersistenceConfig) -> Self {
        Self {
            storage,
            key: config.storage_key,
            _item: PhantomData,
        }
    }

    /// Storage key this adapter owns
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write `items` as a JSON array
    ///
    /// Best effort: failures are logged and counted, never returned.
    pub fn save(&self, items: &[T]) {
        let payload = match serde_json::to_string(items) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Failed to serialise snapshot, write dropped");
                metrics::counter!("persistence.writes.failed", "key" => self.key.clone()).increment(1);
                return;
            },
        };

        match self.storage.set_item(&self.key, &payload) {
            Ok(()) => {
                tracing::trace!(key = %self.key, items = items.len(), "Snapshot written");
                metrics::counter!("persistence.writes.total", "key" => self.key.clone()).increment(1);
            },
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Storage write failed, write dropped");
                metrics::counter!("persistence.writes.failed", "key" => self.key.clone()).increment(1);
            },
        }
    }

    /// Read the stored item list
    ///
    /// Returns `None` when the key is missing, the backend cannot be read,
    /// the payload is not valid JSON, is not an array, or holds elements of
    /// the wrong shape. Callers treat `None` as "nothing stored".
    #[must_use]
    pub fn load(&self) -> Option<Vec<T>> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %self.key, "No stored snapshot");
                metrics::counter!("persistence.load.missing", "key" => self.key.clone()).increment(1);
                return None;
            },
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "Storage read failed, starting empty");
                metrics::counter!("persistence.load.failed", "key" => self.key.clone()).increment(1);
                return None;
            },
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(error) => return self.corrupted(&format!("invalid JSON: {error}")),
        };

        if !value.is_array() {
            return self.corrupted("payload is not an array");
        }

        match serde_json::from_value::<Vec<T>>(value) {
            Ok(items) => {
                tracing::debug!(key = %self.key, items = items.len(), "Loaded stored snapshot");
                Some(items)
            },
            Err(error) => self.corrupted(&format!("unexpected item shape: {error}")),
        }
    }

    /// Remove the stored snapshot (best effort)
    pub fn clear(&self) {
        if let Err(error) = self.storage.remove_item(&self.key) {
            tracing::warn!(key = %self.key, %error, "Failed to remove stored snapshot");
        }
    }

    fn corrupted(&self, reason: &str) -> Option<Vec<T>> {
        tracing::warn!(key = %self.key, reason, "Discarding corrupted snapshot");
        metrics::counter!("persistence.load.corrupted", "key" => self.key.clone()).increment(1);
        None
    }
}

impl<T> std::fmt::Debug for PersistenceAdapter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Adapter plus hydration gate, as plugged into a store
#[derive(Debug)]
pub struct Persistence<T> {
    adapter: PersistenceAdapter<T>,
    gate: HydrationGate,
}

impl<T> Persistence<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create persistence for one store over a shared storage backend
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>, config: PersistenceConfig) -> Self {
        Self {
            adapter: PersistenceAdapter::new(storage, config),
            gate: HydrationGate::new(),
        }
    }

    /// The underlying adapter
    #[must_use]
    pub const fn adapter(&self) -> &PersistenceAdapter<T> {
        &self.adapter
    }

    /// The hydration gate
    #[must_use]
    pub const fn gate(&self) -> &HydrationGate {
        &self.gate
    }
}

impl<S, A, T> StatePersistence<S, A> for Persistence<T>
where
    S: PersistedState<Item = T>,
    A: HydrateAction<Item = T>,
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn restore(&self) -> Restored<A> {
        if self.gate.phase() != GatePhase::Loading {
            return Restored::AlreadyHydrated;
        }

        let items = self.adapter.load();
        self.gate.mark_loaded();

        items.map_or(Restored::Empty, |items| Restored::Snapshot(A::hydrate(items)))
    }

    fn persist(&self, state: &S) {
        if self.gate.should_persist() {
            self.adapter.save(state.items());
        } else {
            tracing::trace!(key = %self.adapter.key(), phase = ?self.gate.phase(), "Write held back by hydration gate");
            metrics::counter!("persistence.writes.skipped", "key" => self.adapter.key().to_string())
                .increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        sku: String,
    }

    fn item(sku: &str) -> Item {
        Item { sku: sku.to_string() }
    }

    fn adapter(storage: &Arc<MemoryStorage>) -> PersistenceAdapter<Item> {
        PersistenceAdapter::new(storage.clone(), PersistenceConfig::new("items"))
    }

    #[test]
    fn gate_holds_writes_until_loaded_then_skips_one_cycle() {
        let gate = HydrationGate::new();

        assert!(!gate.should_persist());
        assert!(!gate.should_persist());
        assert_eq!(gate.phase(), GatePhase::Loading);

        assert!(gate.mark_loaded());
        assert!(!gate.mark_loaded());

        assert!(!gate.should_persist());
        assert_eq!(gate.phase(), GatePhase::Hydrated);
        assert!(gate.should_persist());
        assert!(gate.should_persist());
    }

    proptest::proptest! {
        #[test]
        fn gate_never_opens_before_load(early_checks in 0usize..50, later_checks in 1usize..10) {
            let gate = HydrationGate::new();
            for _ in 0..early_checks {
                proptest::prop_assert!(!gate.should_persist());
            }

            gate.mark_loaded();
            proptest::prop_assert!(!gate.should_persist());
            for _ in 0..later_checks {
                proptest::prop_assert!(gate.should_persist());
            }
        }
    }

    #[test]
    fn save_then_load_returns_items_in_order() {
        let storage = Arc::new(MemoryStorage::new());
        let adapter = adapter(&storage);

        adapter.save(&[item("a"), item("b")]);

        assert_eq!(adapter.load(), Some(vec![item("a"), item("b")]));
        assert_eq!(storage.get("items").as_deref(), Some(r#"[{"sku":"a"},{"sku":"b"}]"#));
    }

    #[test]
    fn load_missing_key_is_none() {
        let storage = Arc::new(MemoryStorage::new());
        assert_eq!(adapter(&storage).load(), None);
    }

    #[test]
    fn load_invalid_json_is_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("items", "{not json");
        assert_eq!(adapter(&storage).load(), None);
    }

    #[test]
    fn load_non_array_is_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("items", r#"{"sku":"a"}"#);
        assert_eq!(adapter(&storage).load(), None);

        storage.insert("items", "null");
        assert_eq!(adapter(&storage).load(), None);
    }

    #[test]
    fn load_wrong_item_shape_is_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("items", r#"[{"sku":"a"},{"price":3}]"#);
        assert_eq!(adapter(&storage).load(), None);
    }

    #[test]
    fn save_over_quota_is_swallowed() {
        let storage = Arc::new(MemoryStorage::with_quota(8));
        let adapter = adapter(&storage);

        adapter.save(&[item("too-long-to-fit")]);

        assert_eq!(storage.get("items"), None);
    }

    #[test]
    fn clear_removes_key() {
        let storage = Arc::new(MemoryStorage::new());
        let adapter = adapter(&storage);
        adapter.save(&[item("a")]);

        adapter.clear();

        assert_eq!(storage.get("items"), None);
    }
}
