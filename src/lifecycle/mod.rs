//! Runtime orchestration and lifecycle management.
//!
//! This module contains:
//!
//! - **Shutdown coordination**: hook ownership and the single teardown routine
//! - **System orchestration**: wiring registry, resolver and coordinator together
//! - **Configuration**: settings applied at construction
//! - **Observability setup**: initializing tracing and logging
//!
//! # Main Components
//!
//! - [`ExtensionSystem`] - The orchestrator hosting applications register with
//! - [`ShutdownCoordinator`] - Arbitrates who triggers teardown, runs it once
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod config;
pub mod extension_system;
pub mod shutdown;
pub mod tracing;

pub use config::*;
pub use extension_system::*;
pub use shutdown::*;
pub use self::tracing::*;
