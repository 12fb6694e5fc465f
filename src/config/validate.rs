//! Configuration validation

use super::schema::EngineConfig;

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid test epsilon: {0} (must be finite and > 0.0)")]
    InvalidTestEpsilon(f64),
}

/// Validate an engine configuration
pub fn validate_config(config: &EngineConfig) -> Result<(), ValidationError> {
    if !config.test_epsilon.is_finite() || config.test_epsilon <= 0.0 {
        return Err(ValidationError::InvalidTestEpsilon(config.test_epsilon));
    }

    Ok(())
}
