//! # In-Memory Container
//!
//! A reference [`Container`] for tests and demos.
//!
//! Use [`InMemoryContainer::new`] for a plain container or
//! [`InMemoryContainer::managed`] for one that manages its own shutdown hook.
//! Then populate it with [`InMemoryContainer::with_component`] and drive its
//! lifecycle with [`InMemoryContainer::close`] or [`InMemoryContainer::host_exit`].
//!
//! ```ignore
//! let container = Arc::new(
//!     InMemoryContainer::managed("orders-app")
//!         .with_component("metrics", Component::new(MetricsSink::default())),
//! );
//! system.register_container(container.clone());
//! container.close(); // publishes ContainerEvent::Closed
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::framework::{
    BridgeError, Component, Container, ContainerEvent, EventListener, ExtensionType, Lookup,
    ManagedLifecycle,
};

/// Simulated host runtime hook of a managed container.
struct HostHook {
    registered: AtomicBool,
    failure: Option<String>,
}

/// A container backed by an ordered list of named components.
pub struct InMemoryContainer {
    name: String,
    components: Mutex<Vec<(String, Component)>>,
    listeners: Mutex<Vec<EventListener>>,
    host_hook: Option<HostHook>,
    closed: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryContainer {
    /// Creates a container without a managed lifecycle.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            host_hook: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a container that can register its own host shutdown hook.
    pub fn managed(name: impl Into<String>) -> Self {
        Self {
            host_hook: Some(HostHook {
                registered: AtomicBool::new(false),
                failure: None,
            }),
            ..Self::new(name)
        }
    }

    /// Makes host hook registration fail with `reason`.
    /// Has no effect on unmanaged containers.
    pub fn failing_host_hook(mut self, reason: impl Into<String>) -> Self {
        if let Some(hook) = self.host_hook.as_mut() {
            hook.failure = Some(reason.into());
        }
        self
    }

    pub fn with_component(self, name: impl Into<String>, component: Component) -> Self {
        self.insert(name, component);
        self
    }

    /// Inserts or replaces the component registered under `name`.
    pub fn insert(&self, name: impl Into<String>, component: Component) {
        let name = name.into();
        let mut components = lock(&self.components);
        match components.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = component,
            None => components.push((name, component)),
        }
    }

    pub fn remove(&self, name: &str) -> Option<Component> {
        let mut components = lock(&self.components);
        let index = components.iter().position(|(existing, _)| existing == name)?;
        Some(components.remove(index).1)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn host_hook_registered(&self) -> bool {
        self.host_hook
            .as_ref()
            .is_some_and(|hook| hook.registered.load(Ordering::SeqCst))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Publishes [`ContainerEvent::Refreshed`].
    pub fn refresh(&self) {
        self.publish(&ContainerEvent::Refreshed);
    }

    /// Closes the container and publishes [`ContainerEvent::Closed`].
    ///
    /// Returns `false` if the container was already closed.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(container = %self.name, "Container closed");
        self.publish(&ContainerEvent::Closed);
        true
    }

    /// Simulates the host runtime terminating.
    ///
    /// Only a container whose host hook is registered reacts, by closing itself.
    pub fn host_exit(&self) -> bool {
        if self.host_hook_registered() {
            self.close()
        } else {
            false
        }
    }

    fn publish(&self, event: &ContainerEvent) {
        // Listeners run without the lock so they may subscribe or query freely.
        let listeners: Vec<EventListener> = lock(&self.listeners).clone();
        debug!(container = %self.name, ?event, listeners = listeners.len(), "Publish");
        for listener in listeners {
            listener(event);
        }
    }
}

impl Container for InMemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_component(&self, name: &str) -> bool {
        lock(&self.components)
            .iter()
            .any(|(existing, _)| existing == name)
    }

    fn component(&self, name: &str) -> Option<Component> {
        lock(&self.components)
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, component)| component.clone())
    }

    fn components_of_type(&self, ty: &ExtensionType) -> Lookup {
        let components = lock(&self.components);
        let mut matches = components
            .iter()
            .filter(|(_, component)| component.is_assignable_to(ty));

        let Some((first_name, first)) = matches.next() else {
            return Lookup::NotFound;
        };
        let rest: Vec<String> = matches.map(|(name, _)| name.clone()).collect();
        if rest.is_empty() {
            return Lookup::Found(first.clone());
        }

        let mut candidates = Vec::with_capacity(rest.len() + 1);
        candidates.push(first_name.clone());
        candidates.extend(rest);
        Lookup::Ambiguous { candidates }
    }

    fn subscribe(&self, listener: EventListener) {
        lock(&self.listeners).push(listener);
    }

    fn managed_lifecycle(&self) -> Option<&dyn ManagedLifecycle> {
        self.host_hook
            .as_ref()
            .map(|_| self as &dyn ManagedLifecycle)
    }
}

impl ManagedLifecycle for InMemoryContainer {
    fn register_host_shutdown_hook(&self) -> Result<(), BridgeError> {
        let Some(hook) = self.host_hook.as_ref() else {
            return Err(BridgeError::HookRegistration {
                container: self.name.clone(),
                reason: "container has no managed lifecycle".into(),
            });
        };
        if self.is_closed() {
            return Err(BridgeError::ContainerClosed(self.name.clone()));
        }
        if let Some(reason) = &hook.failure {
            return Err(BridgeError::HookRegistration {
                container: self.name.clone(),
                reason: reason.clone(),
            });
        }
        hook.registered.store(true, Ordering::SeqCst);
        debug!(container = %self.name, "Host shutdown hook registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::ExtensionPoint;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Codec(&'static str);

    impl ExtensionPoint for Codec {}

    #[test]
    fn test_lookup_by_type() {
        let container = InMemoryContainer::new("ctx")
            .with_component("json", Component::new(Codec("json")))
            .with_component("limit", Component::new(10u64));

        match container.components_of_type(&ExtensionType::of::<Codec>()) {
            Lookup::Found(component) => assert_eq!(component.get::<Codec>().unwrap().0, "json"),
            other => panic!("Expected Found, got {:?}", other),
        }

        container.insert("hessian", Component::new(Codec("hessian")));
        match container.components_of_type(&ExtensionType::of::<Codec>()) {
            Lookup::Ambiguous { candidates } => assert_eq!(candidates, vec!["json", "hessian"]),
            other => panic!("Expected Ambiguous, got {:?}", other),
        }

        container.remove("json");
        container.remove("hessian");
        assert!(matches!(
            container.components_of_type(&ExtensionType::of::<Codec>()),
            Lookup::NotFound
        ));
    }

    #[test]
    fn test_close_publishes_once() {
        let container = InMemoryContainer::new("ctx");
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = closed.clone();
        container.subscribe(Arc::new(move |event: &ContainerEvent| {
            if *event == ContainerEvent::Closed {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        container.refresh();
        assert!(container.close());
        assert!(!container.close());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_host_hook_registration() {
        let plain = InMemoryContainer::new("plain");
        assert!(plain.managed_lifecycle().is_none());

        let managed = InMemoryContainer::managed("managed");
        assert!(!managed.host_exit());
        managed
            .managed_lifecycle()
            .expect("managed lifecycle")
            .register_host_shutdown_hook()
            .unwrap();
        assert!(managed.host_hook_registered());
        assert!(managed.host_exit());
        assert!(managed.is_closed());

        let broken = InMemoryContainer::managed("broken").failing_host_hook("no runtime");
        let err = broken.register_host_shutdown_hook().unwrap_err();
        assert_eq!(
            err,
            BridgeError::HookRegistration {
                container: "broken".into(),
                reason: "no runtime".into()
            }
        );
    }
}
