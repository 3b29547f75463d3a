//! # Extension Bridge
//!
//! > **Resolve extensions across many containers, tear down exactly once.**
//!
//! A process often hosts several independently managed component containers,
//! one per hosting application. This crate lets the extension-loading side of
//! the process treat them as a single federation:
//!
//! - **Resolution**: find a named, typed extension in whichever container holds it.
//! - **Coordinated shutdown**: however many containers are registered, and
//!   whichever closes first, the global teardown routine runs exactly once.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Explicit construction, no ambient globals
//! The registry, resolver and shutdown coordinator are plain values built by
//! [`ExtensionSystem`](lifecycle::ExtensionSystem). Build one at startup and
//! pass it to whatever needs extensions.
//!
//! ### Best-effort resolution
//! A container holding two candidates for a type, or none, must not abort the
//! lookup against the others. Internal misses are logged; callers only ever see
//! `Some` or `None`.
//!
//! ### Idempotent teardown
//! Who triggers teardown (the process-level hook or a container-managed one) is
//! recorded in the coordinator. The routine itself is guarded by a one-shot so
//! the exact trigger path is irrelevant to correctness.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Abstractions ([`framework`])
//! - **Role**: The [`Container`](framework::Container) capability, typed
//!   [`Component`](framework::Component)s and [`ExtensionType`](framework::ExtensionType) descriptors.
//! - **Testing**: [`framework::mock::InMemoryContainer`] is a complete in-memory container.
//!
//! ### 2. The Registry ([`registry`])
//! - **Role**: Concurrency-safe set of registered containers, iterated in registration order.
//!
//! ### 3. The Resolver ([`resolver`])
//! - **Role**: Name pass, then type pass, over a registry snapshot.
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Role**: Hook arbitration, the single teardown, system wiring and tracing setup.
//! - **Key items**: [`ExtensionSystem`](lifecycle::ExtensionSystem),
//!   [`ShutdownCoordinator`](lifecycle::ShutdownCoordinator).
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the two-container demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test
//! ```

pub mod framework;
pub mod lifecycle;
pub mod registry;
pub mod resolver;
