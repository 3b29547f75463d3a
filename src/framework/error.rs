//! # Bridge Errors
//!
//! Errors raised by container collaborators and by the teardown routine.
//! Resolution itself never fails: lookups that miss are reported through
//! `tracing` and surface as `None`.

use thiserror::Error;

/// Errors that can occur while wiring containers into the bridge.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// The container was already closed when the operation was attempted.
    #[error("Container closed: {0}")]
    ContainerClosed(String),

    /// The container could not register its own host shutdown hook.
    #[error("Host shutdown hook registration failed for {container}: {reason}")]
    HookRegistration { container: String, reason: String },

    /// A single teardown step reported a failure.
    #[error("Teardown step `{step}` failed: {reason}")]
    TeardownStep { step: String, reason: String },
}
