//! Two hosting applications sharing one extension system.
//!
//! 1. Registers a plain container and a managed one.
//! 2. Resolves extensions by name and by type.
//! 3. Closes the managed container, which runs teardown once.

use std::sync::Arc;

use extension_bridge::framework::mock::InMemoryContainer;
use extension_bridge::framework::{Component, ExtensionPoint};
use extension_bridge::lifecycle::{setup_tracing, ExtensionSystem, ShutdownRoutine};
use tracing::{info, warn, Instrument};

#[derive(Debug)]
struct Serializer {
    format: &'static str,
}

impl ExtensionPoint for Serializer {}

#[derive(Debug)]
struct RateLimit(u32);

impl ExtensionPoint for RateLimit {}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let routine = ShutdownRoutine::new()
        .with_step("registries", || {
            info!("Unregistering from registries");
            Ok(())
        })
        .with_step("protocols", || {
            info!("Closing protocol servers");
            Ok(())
        });
    let system = ExtensionSystem::new(routine);

    let interrupt = tokio::spawn(system.coordinator().clone().listen_for_ctrl_c());

    let orders = Arc::new(
        InMemoryContainer::new("orders")
            .with_component("serializer", Component::new(Serializer { format: "json" }))
            .with_component("limit", Component::new(RateLimit(100))),
    );
    let billing = Arc::new(
        InMemoryContainer::managed("billing")
            .with_component("serializer", Component::new(Serializer { format: "hessian" })),
    );

    let span = tracing::info_span!("registration");
    async {
        let ownership = system.register_container(orders.clone());
        info!(?ownership, "orders registered");
        let ownership = system.register_container(billing.clone());
        info!(?ownership, "billing registered");
    }
    .instrument(span)
    .await;

    let span = tracing::info_span!("resolution");
    let _enter = span.enter();
    match system.resolve::<Serializer>("serializer") {
        Some(serializer) => info!(format = serializer.format, "Resolved serializer by name"),
        None => warn!("No serializer"),
    }
    match system.resolve::<RateLimit>("rateLimit") {
        Some(limit) => info!(limit = limit.0, "Resolved rate limit by type"),
        None => warn!("No rate limit"),
    }
    drop(_enter);

    // The billing application terminates; its host hook closes the container.
    billing.host_exit();
    orders.close();
    system.coordinator().wait_destroyed().await;

    interrupt.abort();
    match system.coordinator().report() {
        Some(report) if report.is_clean() => info!(steps = ?report.completed, "Teardown clean"),
        Some(report) => {
            return Err(format!("Teardown failed: {:?}", report.failures));
        }
        None => return Err("Teardown did not run".to_string()),
    }

    info!("Application completed successfully");
    Ok(())
}
