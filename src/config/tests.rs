//! Integration tests for config module

use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_end_to_end_config_loading() {
    let yaml = r#"
debug: true
kernel_collision: overwrite
test_epsilon: 0.01
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(yaml.as_bytes()).unwrap();

    let config = load_config(temp_file.path()).unwrap();

    assert!(config.debug);
    assert_eq!(config.kernel_collision, CollisionPolicy::Overwrite);
    assert!((config.test_epsilon - 0.01).abs() < 1e-12);
}

#[test]
fn test_minimal_config() {
    let config = EngineConfig::from_yaml_str("debug: false\n").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.kernel_collision, CollisionPolicy::Error);
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/engine.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_invalid_yaml() {
    let err = EngineConfig::from_yaml_str("kernel_collision: [not, a, policy]").unwrap_err();
    assert!(err.to_string().contains("Failed to parse YAML config"));
}

#[test]
fn test_rejects_non_positive_epsilon() {
    let err = EngineConfig::from_yaml_str("test_epsilon: 0.0").unwrap_err();
    assert!(err.to_string().contains("Invalid test epsilon"));

    let config = EngineConfig {
        test_epsilon: f64::NAN,
        ..EngineConfig::default()
    };
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_yaml_round_trip() {
    let config = EngineConfig {
        debug: true,
        kernel_collision: CollisionPolicy::Overwrite,
        test_epsilon: 0.5,
    };
    let yaml = config.to_yaml_string().unwrap();
    assert_eq!(EngineConfig::from_yaml_str(&yaml).unwrap(), config);
}
