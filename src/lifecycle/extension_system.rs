use std::sync::Arc;

use tracing::{debug, info};

use crate::framework::{Container, ExtensionPoint};
use crate::lifecycle::{HookOwnership, ShutdownCoordinator, ShutdownRoutine, SystemConfig};
use crate::registry::ContainerRegistry;
use crate::resolver::ExtensionResolver;

/// The process-wide entry point hosting applications register with.
///
/// `ExtensionSystem` is responsible for:
/// - **Registration**: adding containers to the shared registry
/// - **Hook Arbitration**: handing each new container to the [`ShutdownCoordinator`]
/// - **Resolution**: exposing an [`ExtensionResolver`] over the same registry
///
/// Construct exactly one per process and pass it (or its resolver) to the
/// subsystems that load extensions.
///
/// # Example
///
/// ```ignore
/// let system = ExtensionSystem::new(
///     ShutdownRoutine::new().with_step("protocols", close_protocols),
/// );
///
/// // Each hosting application registers its container at startup.
/// system.register_container(orders_context.clone());
/// system.register_container(billing_context.clone());
///
/// let serializer = system.resolve::<JsonSerializer>("serializer");
///
/// // Closing either container runs teardown; closing the other does nothing more.
/// orders_context.close();
/// ```
pub struct ExtensionSystem {
    registry: Arc<ContainerRegistry>,
    coordinator: Arc<ShutdownCoordinator>,
    resolver: ExtensionResolver,
}

impl ExtensionSystem {
    /// Creates a system with the default [`SystemConfig`].
    pub fn new(routine: ShutdownRoutine) -> Self {
        Self::with_config(routine, SystemConfig::default())
    }

    pub fn with_config(routine: ShutdownRoutine, config: SystemConfig) -> Self {
        let registry = Arc::new(ContainerRegistry::new());
        let coordinator = Arc::new(ShutdownCoordinator::new(routine));
        if config.arm_process_hook {
            coordinator.arm();
        }
        let resolver =
            ExtensionResolver::new(registry.clone()).with_type_fallback(config.type_fallback);
        info!(?config, "Extension system started");

        Self {
            registry,
            coordinator,
            resolver,
        }
    }

    /// Registers a hosting application's container.
    ///
    /// Registering the same container again is a no-op; its close listener is
    /// only subscribed once. Returns the hook ownership after registration.
    pub fn register_container(&self, container: Arc<dyn Container>) -> HookOwnership {
        if !self.registry.add(container.clone()) {
            return self.coordinator.ownership();
        }
        let ownership = self.coordinator.attach(&*container);
        info!(container = container.name(), ?ownership, "Container registered");
        ownership
    }

    /// Removes a container from resolution.
    ///
    /// Hook ownership is left untouched and teardown is not triggered.
    pub fn unregister_container<C: Container + ?Sized>(&self, container: &Arc<C>) -> bool {
        let removed = self.registry.remove(container);
        debug!(container = container.name(), removed, "Container unregistered");
        removed
    }

    pub fn resolve<T: ?Sized + ExtensionPoint>(&self, name: &str) -> Option<Arc<T>> {
        self.resolver.resolve::<T>(name)
    }

    pub fn resolver(&self) -> &ExtensionResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &Arc<ContainerRegistry> {
        &self.registry
    }

    pub fn coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.coordinator
    }

    /// Runs teardown now, unless some trigger already did.
    pub fn shutdown(&self) -> bool {
        info!("Shutting down extension system...");
        self.coordinator.destroy()
    }
}
