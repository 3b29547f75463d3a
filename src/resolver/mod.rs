//! # Extension Resolver
//!
//! Resolves a named, typed extension across every registered container.
//!
//! ## Algorithm
//!
//! 1. SPI contracts are refused outright; a dedicated loader handles them.
//! 2. **Name pass**: containers are scanned in registration order. The first
//!    component registered under `name` that is assignable to the requested
//!    type wins. A name hit of the wrong type is skipped, not an error.
//! 3. The top type stops here: a type-only search for "anything" is unbounded.
//! 4. **Type pass**: containers are scanned again in the same order. The first
//!    container holding exactly one component of the type wins. A container
//!    holding several is reported and skipped.
//!
//! Misses and ambiguities never reach the caller. They are logged through
//! `tracing` and the caller only sees `Some` or `None`, so one inconsistent
//! container cannot abort resolution against the others.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::framework::{Component, Container, ExtensionPoint, ExtensionType, Lookup};
use crate::registry::ContainerRegistry;

/// Stateless lookup over a shared [`ContainerRegistry`].
#[derive(Clone)]
pub struct ExtensionResolver {
    registry: Arc<ContainerRegistry>,
    type_fallback: bool,
}

impl ExtensionResolver {
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self {
            registry,
            type_fallback: true,
        }
    }

    /// Enables or disables the type pass.
    pub fn with_type_fallback(mut self, enabled: bool) -> Self {
        self.type_fallback = enabled;
        self
    }

    /// Resolves `name` as a `T`.
    pub fn resolve<T: ?Sized + ExtensionPoint>(&self, name: &str) -> Option<Arc<T>> {
        self.resolve_component(&ExtensionType::of::<T>(), name)?
            .get::<T>()
    }

    /// Resolves `name` against a runtime type descriptor.
    #[instrument(level = "debug", skip(self, ty), fields(ty = %ty))]
    pub fn resolve_component(&self, ty: &ExtensionType, name: &str) -> Option<Component> {
        if ty.is_spi() {
            debug!("SPI contract, not resolved from containers");
            return None;
        }

        let containers = self.registry.snapshot();

        if let Some(component) = find_by_name(&containers, ty, name) {
            return Some(component);
        }

        warn!(
            containers = containers.len(),
            "No extension named {} of type {}, trying lookup by type", name, ty
        );

        if ty.is_any() || !self.type_fallback {
            return None;
        }

        if let Some(component) = find_by_type(&containers, ty) {
            return Some(component);
        }

        warn!("No extension named {} or of type {} found", name, ty);
        None
    }
}

fn find_by_name(
    containers: &[Arc<dyn Container>],
    ty: &ExtensionType,
    name: &str,
) -> Option<Component> {
    for container in containers {
        if !container.has_component(name) {
            continue;
        }
        // The component may vanish between the two calls; treat that as a miss.
        let Some(component) = container.component(name) else {
            continue;
        };
        if component.is_assignable_to(ty) {
            debug!(container = container.name(), "Resolved by name");
            return Some(component);
        }
        debug!(
            container = container.name(),
            actual = component.type_name(),
            "Name matched a component of another type"
        );
    }
    None
}

fn find_by_type(containers: &[Arc<dyn Container>], ty: &ExtensionType) -> Option<Component> {
    for container in containers {
        match container.components_of_type(ty) {
            Lookup::Found(component) => {
                debug!(container = container.name(), "Resolved by type");
                return Some(component);
            }
            Lookup::Ambiguous { candidates } => {
                warn!(
                    container = container.name(),
                    ?candidates,
                    "More than one extension of type {}, skipping container. \
                     Request a more specific type or a name that exists",
                    ty
                );
            }
            Lookup::NotFound => {
                debug!(container = container.name(), "No extension of type {}", ty);
            }
        }
    }
    None
}
