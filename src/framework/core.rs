//! # Core Container Abstractions
//!
//! This module defines the building blocks the bridge is written against.
//!
//! ## Key Types
//!
//! - [`Container`]: The capability every hosting container exposes.
//! - [`ManagedLifecycle`]: Optional capability of containers that manage their own shutdown.
//! - [`Component`]: A container-supplied object plus the typed views it can be read as.
//! - [`ExtensionType`]: Runtime descriptor of a requested extension type.
//! - [`Lookup`]: Tri-state result of a by-type lookup (Found, NotFound, Ambiguous).

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use crate::framework::BridgeError;

/// The top type. Every component is assignable to it.
pub type AnyComponent = dyn Any + Send + Sync;

// =============================================================================
// 1. TYPE DESCRIPTORS
// =============================================================================

/// Marker for types that can be requested from the bridge.
///
/// Implement it for concrete structs and for trait objects alike:
///
/// ```ignore
/// impl ExtensionPoint for MetricsSink {}
///
/// // Pluggable contracts resolved by a different loader opt out of container lookup.
/// impl ExtensionPoint for dyn Protocol {
///     const SPI: bool = true;
/// }
/// ```
pub trait ExtensionPoint: 'static {
    /// Whether the type is a self-describing pluggable contract.
    /// The resolver refuses such types outright.
    const SPI: bool = false;
}

impl ExtensionPoint for AnyComponent {}

/// How the resolver must treat a requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// An ordinary type, looked up by name and then by type.
    Concrete,
    /// A pluggable contract excluded from container lookup.
    Spi,
    /// The top type; only the name pass applies.
    Any,
}

/// Runtime descriptor of a requested extension type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionType {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl ExtensionType {
    pub fn of<T: ?Sized + ExtensionPoint>() -> Self {
        let id = TypeId::of::<T>();
        let kind = if id == TypeId::of::<AnyComponent>() {
            TypeKind::Any
        } else if T::SPI {
            TypeKind::Spi
        } else {
            TypeKind::Concrete
        };
        Self {
            id,
            name: type_name::<T>(),
            kind,
        }
    }

    /// Descriptor of the top type.
    pub fn any() -> Self {
        Self::of::<AnyComponent>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_spi(&self) -> bool {
        self.kind == TypeKind::Spi
    }

    pub fn is_any(&self) -> bool {
        self.kind == TypeKind::Any
    }
}

impl Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// =============================================================================
// 2. COMPONENTS & LOOKUPS
// =============================================================================

/// An object held by a container.
///
/// # Assignability
/// Rust has no runtime subtyping, so a component carries the list of typed
/// views it may be read as. [`Component::from_arc`] registers the concrete type
/// and the top type; [`Component::with_view`] adds trait-object views:
///
/// ```ignore
/// let registry = Arc::new(ZookeeperRegistry::default());
/// let component = Component::from_arc(registry.clone())
///     .with_view::<dyn Registry>(registry);
/// ```
///
/// The resolver only ever asks [`Component::is_assignable_to`], so the type
/// check stays with whoever built the component.
#[derive(Clone)]
pub struct Component {
    value: Arc<AnyComponent>,
    type_name: &'static str,
    views: HashMap<TypeId, Arc<AnyComponent>>,
}

impl Component {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        let erased: Arc<AnyComponent> = value.clone();
        let mut views: HashMap<TypeId, Arc<AnyComponent>> = HashMap::new();
        views.insert(TypeId::of::<T>(), Arc::new(value));
        views.insert(TypeId::of::<AnyComponent>(), Arc::new(erased.clone()));
        Self {
            value: erased,
            type_name: type_name::<T>(),
            views,
        }
    }

    /// Declares that this component can also be read as `U`.
    ///
    /// `view` must point at the same object as the component itself.
    pub fn with_view<U: ?Sized + Send + Sync + 'static>(mut self, view: Arc<U>) -> Self {
        self.views.insert(TypeId::of::<U>(), Arc::new(view));
        self
    }

    pub fn is_assignable_to(&self, ty: &ExtensionType) -> bool {
        ty.is_any() || self.views.contains_key(&ty.id())
    }

    /// Reads the component as `T`, if it exposes that view.
    pub fn get<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.views
            .get(&TypeId::of::<T>())?
            .downcast_ref::<Arc<T>>()
            .cloned()
    }

    pub fn value(&self) -> &Arc<AnyComponent> {
        &self.value
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Identity comparison: both handles refer to the same object.
    pub fn same_instance(&self, other: &Component) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }
}

impl Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type_name", &self.type_name)
            .field("views", &self.views.len())
            .finish()
    }
}

/// Result of a by-type lookup inside a single container.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Exactly one component is assignable to the requested type.
    Found(Component),
    /// No component is assignable to the requested type.
    NotFound,
    /// More than one component matches; `candidates` holds their names.
    Ambiguous { candidates: Vec<String> },
}

// =============================================================================
// 3. THE CONTAINER CAPABILITY
// =============================================================================

/// Lifecycle events a container publishes to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerEvent {
    Refreshed,
    Closed,
}

/// Callback subscribed to a container's event stream.
pub type EventListener = Arc<dyn Fn(&ContainerEvent) + Send + Sync>;

/// A component-holding unit owned by a hosting application.
///
/// The bridge never creates, wires or destroys components; it only queries
/// containers and listens to them. Identity is the `Arc` the container is
/// registered under.
pub trait Container: Send + Sync {
    /// Human-readable name, used in diagnostics only.
    fn name(&self) -> &str;

    fn has_component(&self, name: &str) -> bool;

    fn component(&self, name: &str) -> Option<Component>;

    /// Finds the unique component assignable to `ty`.
    fn components_of_type(&self, ty: &ExtensionType) -> Lookup;

    /// Subscribes `listener` to every event this container publishes.
    fn subscribe(&self, listener: EventListener);

    /// Returns the managed-lifecycle capability, for containers that have one.
    fn managed_lifecycle(&self) -> Option<&dyn ManagedLifecycle> {
        None
    }
}

/// Capability of containers that manage their own termination.
pub trait ManagedLifecycle: Send + Sync {
    /// Asks the container to install its own hook with its host runtime,
    /// so that it publishes [`ContainerEvent::Closed`] when the host terminates.
    fn register_host_shutdown_hook(&self) -> Result<(), BridgeError>;
}
