//! Scoped context.
//!
//! A [`Scope`] is the explicit replacement for ambient singletons: the
//! application root creates one, providers put their stores into it, and
//! consumers receive the scope (or a child of it) and look the stores up by
//! type. Child scopes see everything their ancestors provide, and can shadow
//! it, which keeps stores testable in isolation.

use crate::error::StoreError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

type Provided = Arc<dyn Any + Send + Sync>;

/// A node in the context tree
#[derive(Clone, Default)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    parent: Option<Scope>,
    values: RwLock<HashMap<TypeId, Provided>>,
}

impl Scope {
    /// Create a root scope with nothing provided
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Create a child scope that inherits everything provided here
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent: Some(self.clone()),
                values: RwLock::default(),
            }),
        }
    }

    /// Make `value` available to this scope and its descendants
    ///
    /// Providing the same type twice replaces the earlier value.
    pub fn provide<T>(&self, value: T)
    where
        T: Any + Send + Sync,
    {
        tracing::debug!(type_name = std::any::type_name::<T>(), "Providing value to scope");
        self.inner
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Look up a value, searching this scope and then its ancestors
    #[must_use]
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let local = self
            .inner
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .cloned();

        match local {
            Some(value) => value.downcast::<T>().ok(),
            None => self.inner.parent.as_ref().and_then(Self::get::<T>),
        }
    }

    /// Look up a value that a provider must have mounted
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutsideScope`] when neither this scope nor any
    /// ancestor provides `T`. That is a wiring defect; propagate it.
    pub fn require<T>(&self) -> Result<Arc<T>, StoreError>
    where
        T: Any + Send + Sync,
    {
        self.get::<T>().ok_or_else(|| {
            let type_name = std::any::type_name::<T>();
            tracing::error!(type_name, "Requested outside of provider scope");
            StoreError::OutsideScope { type_name }
        })
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provided = self
            .inner
            .values
            .read()
            .map_or(0, |values| values.len());
        f.debug_struct("Scope")
            .field("provided", &provided)
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
