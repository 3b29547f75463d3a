//! Concurrency-safe set of registered containers.
//!
//! Membership is by `Arc` identity. Iteration follows insertion order, so the
//! first registered container is always tried first by the resolver.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::framework::Container;

/// The set of containers extensions are resolved from.
///
/// The registry never owns a container's lifecycle: removing a container
/// only drops the registry's handle.
#[derive(Default)]
pub struct ContainerRegistry {
    containers: RwLock<Vec<Arc<dyn Container>>>,
}

fn same_container<C: Container + ?Sized>(a: &Arc<dyn Container>, b: &Arc<C>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `container` unless it is already registered.
    ///
    /// Returns `true` when the container was newly inserted.
    pub fn add(&self, container: Arc<dyn Container>) -> bool {
        let mut containers = self
            .containers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if containers.iter().any(|existing| same_container(existing, &container)) {
            debug!(container = container.name(), "Already registered");
            return false;
        }
        debug!(container = container.name(), size = containers.len() + 1, "Registered");
        containers.push(container);
        true
    }

    /// Removes `container` if present.
    pub fn remove<C: Container + ?Sized>(&self, container: &Arc<C>) -> bool {
        let mut containers = self
            .containers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = containers.len();
        containers.retain(|existing| !same_container(existing, container));
        let removed = containers.len() != before;
        if removed {
            debug!(container = container.name(), size = containers.len(), "Unregistered");
        }
        removed
    }

    /// Point-in-time copy of the registered containers, in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Container>> {
        self.containers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains<C: Container + ?Sized>(&self, container: &Arc<C>) -> bool {
        self.containers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|existing| same_container(existing, container))
    }

    pub fn len(&self) -> usize {
        self.containers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties the registry. Intended for tests and resets.
    pub fn clear(&self) {
        self.containers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
