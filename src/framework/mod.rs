//! Container abstractions the bridge operates on.
//!
//! # Main Components
//!
//! - [`Container`] - Capability implemented by every hosting container
//! - [`ManagedLifecycle`] - Capability of containers that own their shutdown hook
//! - [`Component`] / [`ExtensionType`] - Typed objects and type descriptors
//! - [`BridgeError`] - Errors raised by collaborators and teardown steps
//!
//! # Testing
//!
//! See [`mock`] module for an in-memory container usable in tests and demos.

pub mod core;
pub mod error;
pub mod mock;

// Re-export core types for convenience
pub use self::core::*;
pub use error::BridgeError;
