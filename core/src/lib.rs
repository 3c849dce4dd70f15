//! # Commerce State Core
//!
//! Core traits and types for the storefront commerce state engine.
//!
//! This crate provides the abstractions shared by every client-side store:
//! the cart, the wishlist, and anything built the same way later.
//!
//! ## Core Concepts
//!
//! - **State**: The ordered item list a store renders from
//! - **Action**: Every input a store accepts (hydrate, add, remove, ...)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies, such as durable storage
//!
//! ## Example
//!
//! ```ignore
//! use commerce_state_core::*;
//!
//! #[derive(Clone, Debug, Default)]
//! struct CartState {
//!     items: Vec<CartLineItem>,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CartAction {
//!     AddItem { item: CartLineItem },
//!     ClearCart,
//! }
//!
//! impl Reducer for CartReducer {
//!     type State = CartState;
//!     type Action = CartAction;
//!     type Environment = CartEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CartState,
//!         action: CartAction,
//!         env: &CartEnvironment,
//!     ) -> SmallVec<[Effect<CartAction>; 4]> {
//!         // Business logic goes here
//!         SmallVec::new()
//!     }
//! }
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Catalog references shared by the feature stores
pub mod catalog;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all mutation logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for WishlistReducer {
    ///     type State = WishlistState;
    ///     type Action = WishlistAction;
    ///     type Environment = WishlistEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut WishlistState,
    ///         action: WishlistAction,
    ///         env: &WishlistEnvironment,
    ///     ) -> SmallVec<[Effect<WishlistAction>; 4]> {
    ///         match action {
    ///             WishlistAction::ClearWishlist => state.items.clear(),
    ///             _ => {}
    ///         }
    ///         SmallVec::new()
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// The effects to be executed by the runtime (usually none)
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an async computation that feeds an action back into the store
        #[must_use]
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: std::future::Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// into stores. The only dependency the commerce stores have is durable
/// key/value storage (browser local storage, a directory on disk, or memory).
pub mod environment {
    use thiserror::Error;

    /// Errors a durable storage backend can report
    ///
    /// None of these reach facade callers: the persistence adapter logs
    /// and drops them.
    #[derive(Error, Debug)]
    pub enum StorageError {
        /// Storage is disabled or cannot be reached
        #[error("Storage unavailable: {0}")]
        Unavailable(String),

        /// The backend refused the write because it is full
        #[error("Storage quota exceeded writing {bytes} bytes to '{key}'")]
        QuotaExceeded {
            /// Key being written
            key: String,
            /// Size of the rejected value
            bytes: usize,
        },

        /// Underlying I/O failure
        #[error("Storage I/O error: {0}")]
        Io(#[from] std::io::Error),
    }

    /// Durable key/value storage (the DOM `Storage` contract)
    ///
    /// Values are opaque strings; the persistence adapter stores JSON in them.
    /// Implementations must be object-safe so stores can share one backend
    /// behind an `Arc<dyn DurableStorage>`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Browser-like: one file per key
    /// let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::open(".storefront")?);
    ///
    /// // Test: in memory, with write counting
    /// let storage = Arc::new(MemoryStorage::new());
    /// ```
    pub trait DurableStorage: Send + Sync {
        /// Read the value stored under `key`, `Ok(None)` when absent
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] when the backend cannot be read.
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

        /// Store `value` under `key`, replacing any previous value
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] when the write is rejected or fails.
        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

        /// Remove `key`; removing a missing key is not an error
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] when the backend cannot be modified.
        fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Ping,
    }

    #[test]
    fn effect_debug_hides_future() {
        let effect = Effect::<TestAction>::future(async { Some(TestAction::Ping) });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn merge_and_chain_wrap_effects() {
        let merged = Effect::<TestAction>::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref v) if v.len() == 2));

        let chained = Effect::<TestAction>::chain(vec![Effect::None]);
        assert!(matches!(chained, Effect::Sequential(ref v) if v.len() == 1));
    }
}
