//! # Commerce State Runtime
//!
//! Runtime implementation for the storefront commerce state engine.
//!
//! This crate provides the Store runtime that coordinates reducer execution,
//! persistence to durable storage, and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, serialises dispatches, notifies subscribers
//! - **Persistence**: Adapter to durable storage plus the hydration gate
//! - **Scope**: Explicit context through which facades reach their stores
//! - **Effect Executor**: Executes effect descriptions and feeds actions back
//!
//! ## Example
//!
//! ```ignore
//! use commerce_state_runtime::{MemoryStorage, Persistence, PersistenceConfig, Store};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let persistence = Persistence::new(storage, PersistenceConfig::new("cart"));
//! let store = Store::with_persistence(
//!     CartState::default(),
//!     CartReducer::new(),
//!     CartEnvironment,
//!     persistence,
//! );
//!
//! // Load the stored snapshot before the first mutation is persisted
//! store.hydrate().await;
//!
//! store.send(CartAction::ClearCart).await;
//! let count = store.state(|s| s.items.len()).await;
//! ```

use commerce_state_core::{effect::Effect, reducer::Reducer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

/// In-memory durable storage backend
pub mod memory;

/// Prometheus metrics for observability
pub mod metrics;

/// Persistence adapter and hydration gate
pub mod persistence;

/// Scoped context for handing stores to their consumers
pub mod scope;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// A facade was requested from a scope that no provider mounted it in
        ///
        /// This is a wiring defect, not a runtime condition: the component
        /// asking for the store sits outside the provider that owns it.
        #[error("{type_name} requested outside of its provider scope")]
        OutsideScope {
            /// Type that was requested
            type_name: &'static str,
        },

        /// Timeout waiting for effects to complete
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;
pub use memory::MemoryStorage;
pub use persistence::{
    GatePhase, HydrateAction, HydrationGate, Persistence, PersistenceAdapter, PersistenceConfig,
    PersistedState, Restored, StatePersistence,
};
pub use scope::Scope;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for effects to complete.
/// The commerce reducers never produce effects, so their handles are
/// complete as soon as `send` returns.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle
    ///
    /// # Returns
    ///
    /// A tuple of `(EffectHandle, EffectTracking)` where:
    /// - `EffectHandle` is returned to the caller for waiting
    /// - `EffectTracking` is used internally for effect execution
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Store runtime for coordinating reducer execution, persistence, and effects.
pub mod store {
    use super::{
        Arc, DecrementGuard, Effect, EffectHandle, EffectTracking, Reducer, RwLock, watch,
    };
    use crate::persistence::{Restored, StatePersistence};
    use smallvec::SmallVec;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, so dispatches are serialised)
    /// 2. Reducer (mutation logic)
    /// 3. Environment (injected dependencies)
    /// 4. Persistence (optional, runs inside the dispatch critical section)
    /// 5. Change notification (revision counter on a watch channel)
    ///
    /// Cloning a Store is cheap and every clone shares the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        persistence: Option<Arc<dyn StatePersistence<S, A>>>,
        revision: Arc<watch::Sender<u64>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create an in-memory store with initial state, reducer, and environment
        ///
        /// Nothing is written to durable storage; `hydrate` is a no-op.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::build(initial_state, reducer, environment, None)
        }

        /// Create a store whose state is persisted after every dispatch
        ///
        /// Writes stay disabled until [`Store::hydrate`] has attempted to load
        /// the stored snapshot, so the initial empty state can never overwrite
        /// what a previous session saved.
        #[must_use]
        pub fn with_persistence<P>(initial_state: S, reducer: R, environment: E, persistence: P) -> Self
        where
            P: StatePersistence<S, A> + 'static,
        {
            Self::build(initial_state, reducer, environment, Some(Arc::new(persistence)))
        }

        fn build(
            initial_state: S,
            reducer: R,
            environment: E,
            persistence: Option<Arc<dyn StatePersistence<S, A>>>,
        ) -> Self {
            let (revision, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                persistence,
                revision: Arc::new(revision),
            }
        }

        /// Load the stored snapshot and open the hydration gate
        ///
        /// 1. Reads durable storage (corrupt or missing data reads as nothing)
        /// 2. Marks the initial load as resolved
        /// 3. Dispatches the hydrate action when a snapshot was found
        ///
        /// The dispatch cycle in which the gate opens never writes; only
        /// later dispatches do. All of this happens under the state lock, so no
        /// other dispatch can interleave with hydration.
        ///
        /// Calling this more than once, or on a store without persistence, does nothing.
        #[tracing::instrument(skip(self), name = "store_hydrate")]
        pub async fn hydrate(&self) -> EffectHandle {
            let Some(persistence) = self.persistence.as_ref() else {
                return EffectHandle::completed();
            };

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                match persistence.restore() {
                    Restored::Snapshot(action) => {
                        tracing::debug!("Hydrating from stored snapshot");
                        self.reduce_locked(&mut state, action)
                    },
                    Restored::Empty => {
                        tracing::debug!("No stored snapshot, starting empty");
                        persistence.persist(&state);
                        SmallVec::new()
                    },
                    Restored::AlreadyHydrated => {
                        tracing::warn!("Store already hydrated, ignoring");
                        SmallVec::new()
                    },
                }
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            handle
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Persists the new state (once the hydration gate is open)
        /// 4. Bumps the revision so subscribers re-render
        /// 5. Executes returned effects asynchronously
        ///
        /// Concurrent `send()` calls serialise on the lock, so each dispatch
        /// (including its storage write) completes before the next one starts.
        ///
        /// # Returns
        ///
        /// An [`EffectHandle`] that can be used to wait for effect completion.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> EffectHandle {
            tracing::debug!("Processing action");
            metrics::counter!("store.actions.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");
                self.reduce_locked(&mut state, action)
            };

            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            handle
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to state changes
        ///
        /// The receiver observes a revision number that increases after every
        /// dispatch. Await `changed()` and then read the state.
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<u64> {
            self.revision.subscribe()
        }

        /// Current revision (number of dispatches applied so far)
        #[must_use]
        pub fn revision(&self) -> u64 {
            *self.revision.borrow()
        }

        fn reduce_locked(&self, state: &mut S, action: A) -> SmallVec<[Effect<A>; 4]> {
            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(state, action, &self.environment);

            if let Some(persistence) = &self.persistence {
                persistence.persist(state);
            }
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));

            effects
        }

        /// Execute an effect with tracking
        ///
        /// # Effect Types
        ///
        /// - `None`: No-op
        /// - `Future`: Executes async computation, sends resulting action if `Some`
        /// - `Parallel`: Executes effects concurrently
        /// - `Sequential`: Executes effects in order, waiting for each to complete
        ///
        /// Effect failures (including panics inside spawned tasks) are isolated
        /// from the store; [`DecrementGuard`] keeps the handle's counter accurate.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into spawned tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            let _ = store.send(action).await;
                        }
                    });
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    tracking.increment();

                    let guard = DecrementGuard(tracking.clone());
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = guard;

                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute_effect(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                persistence: self.persistence.clone(),
                revision: Arc::clone(&self.revision),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_state_core::{smallvec, SmallVec};

    #[derive(Debug, Clone, Default)]
    struct TestState {
        value: i32,
    }

    #[derive(Debug, Clone)]
    enum TestAction {
        Increment,
        Decrement,
        ProduceEffect,
        ProduceParallelEffects,
        ProduceSequentialEffects,
        ProducePanickingEffect,
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    SmallVec::new()
                },
                TestAction::Decrement => {
                    state.value -= 1;
                    SmallVec::new()
                },
                TestAction::ProduceEffect => {
                    smallvec![Effect::future(async { Some(TestAction::Increment) })]
                },
                TestAction::ProduceParallelEffects => smallvec![Effect::merge(vec![
                    Effect::future(async { Some(TestAction::Increment) }),
                    Effect::future(async { Some(TestAction::Increment) }),
                    Effect::future(async { Some(TestAction::Increment) }),
                ])],
                TestAction::ProduceSequentialEffects => smallvec![Effect::chain(vec![
                    Effect::future(async { Some(TestAction::Increment) }),
                    Effect::future(async { Some(TestAction::Increment) }),
                    Effect::future(async { Some(TestAction::Decrement) }),
                ])],
                TestAction::ProducePanickingEffect => {
                    #[allow(clippy::panic)] // Intentional panic for testing isolation
                    {
                        smallvec![Effect::future(async {
                            panic!("Intentional panic in effect for testing");
                        })]
                    }
                },
            }
        }
    }

    fn test_store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState::default(), TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_send_action() {
        let store = test_store();

        let _ = store.send(TestAction::Increment).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    struct SlowPersistence;

    impl crate::persistence::StatePersistence<TestState, TestAction> for SlowPersistence {
        fn restore(&self) -> crate::persistence::Restored<TestAction> {
            crate::persistence::Restored::Empty
        }

        fn persist(&self, _state: &TestState) {
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    #[test]
    fn test_reducer_duration_includes_persistence_write() -> Result<(), Box<dyn std::error::Error>> {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let store = Store::with_persistence(TestState::default(), TestReducer, TestEnv, SlowPersistence);
                let _ = store.send(TestAction::Increment).await;
            });
        });

        let rendered = handle.render();
        let sum = rendered
            .lines()
            .find(|line| line.starts_with("store_reducer_duration_seconds_sum"))
            .and_then(|line| line.split_whitespace().last())
            .and_then(|value| value.parse::<f64>().ok());

        assert!(sum.is_some_and(|seconds| seconds >= 0.05), "rendered: {rendered}");
        Ok(())
    }

    #[tokio::test]
    async fn test_effect_future_feeds_back() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProduceEffect).await;
        assert!(handle.wait_with_timeout(Duration::from_secs(1)).await.is_ok());

        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_parallel() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProduceParallelEffects).await;
        assert!(handle.wait_with_timeout(Duration::from_secs(1)).await.is_ok());

        assert_eq!(store.state(|s| s.value).await, 3);
    }

    #[tokio::test]
    async fn test_effect_sequential() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProduceSequentialEffects).await;
        assert!(handle.wait_with_timeout(Duration::from_secs(1)).await.is_ok());

        // Net result: +1 +1 -1 = 1
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn test_effect_panic_isolation() {
        let store = test_store();

        let mut handle = store.send(TestAction::ProducePanickingEffect).await;
        assert!(handle.wait_with_timeout(Duration::from_secs(1)).await.is_ok());

        // Store still accepts actions
        let _ = store.send(TestAction::Increment).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    #[allow(clippy::panic)] // Tests are allowed to panic on failures
    async fn test_concurrent_sends_serialise() {
        let store = test_store();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let _ = store.send(TestAction::Increment).await;
                })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                panic!("concurrent send task panicked: {e}");
            }
        }

        assert_eq!(store.state(|s| s.value).await, 10);
        assert_eq!(store.revision(), 10);
    }

    #[tokio::test]
    async fn test_subscribe_sees_revision_bump() {
        let store = test_store();
        let mut changes = store.subscribe();

        let _ = store.send(TestAction::Increment).await;

        assert!(changes.has_changed().unwrap_or(false));
        assert_eq!(*changes.borrow_and_update(), 1);
    }

    #[tokio::test]
    async fn test_hydrate_without_persistence_is_noop() {
        let store = test_store();

        let handle = store.hydrate().await;
        assert_eq!(handle.pending(), 0);
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn test_store_clone_shares_state() {
        let store1 = test_store();
        let store2 = store1.clone();

        let _ = store1.send(TestAction::Increment).await;
        assert_eq!(store2.state(|s| s.value).await, 1);
    }
}
