//! Runtime configuration for an [`ExtensionSystem`](crate::lifecycle::ExtensionSystem).

use serde::{Deserialize, Serialize};

/// Settings applied when an extension system is constructed.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```ignore
/// let config: SystemConfig = serde_json::from_str(r#"{ "type_fallback": false }"#)?;
/// assert!(config.arm_process_hook);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Arm the process-level shutdown hook at construction.
    pub arm_process_hook: bool,
    /// Fall back to a by-type lookup when no component matches by name.
    pub type_fallback: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            arm_process_hook: true,
            type_fallback: true,
        }
    }
}
