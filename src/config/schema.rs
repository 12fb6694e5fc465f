//! YAML schema for engine configuration

use serde::{Deserialize, Serialize};

/// What happens when a kernel or gradient name is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Reject the second registration
    #[default]
    Error,
    /// Replace the existing entry and log a warning
    Overwrite,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scan every float kernel output for NaN
    pub debug: bool,

    /// Registration collision policy
    pub kernel_collision: CollisionPolicy,

    /// Default tolerance used by the array comparison helpers
    pub test_epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            kernel_collision: CollisionPolicy::Error,
            test_epsilon: 1e-3,
        }
    }
}
