//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the
//! `tracing` crate.
//!
//! ## What Gets Traced
//!
//! - **Registration**: containers added and removed, hook ownership changes
//! - **Resolution**: name and type passes, ambiguous containers, misses
//! - **Teardown**: the single run, each step and its failures
//!
//! ## Usage Examples
//!
//! ```bash
//! # Ownership changes, misses and teardown
//! RUST_LOG=info cargo run
//!
//! # Every lookup, per container
//! RUST_LOG=debug cargo run
//!
//! # Only the resolver
//! RUST_LOG=extension_bridge::resolver=debug cargo run
//! ```
//!
//! With `RUST_LOG=debug` a resolution that falls back to the type pass reads:
//!
//! ```text
//! DEBUG resolve_component: Name matched a component of another type ty=demo::Serializer name="codec" container="billing" actual="u32"
//! WARN  resolve_component: No extension named codec of type demo::Serializer, trying lookup by type ty=demo::Serializer name="codec" containers=2
//! DEBUG resolve_component: Resolved by type ty=demo::Serializer name="codec" container="billing"
//! ```

/// Initializes the global subscriber, filtered by `RUST_LOG`.
///
/// Call once, from the binary.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
