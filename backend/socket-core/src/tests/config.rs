// Unit tests for socket configuration load/save/validate.

use crate::config::{CONFIG_FILE_NAME, SocketConfig};
use crate::error::config::ConfigError;

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tempfile::TempDir;

/// **VALUE**: Verifies defaults match the documented listener settings.
///
/// **WHY THIS MATTERS**: Clients assume a localhost listener in 3000..8000. Changing a
/// default silently changes where every terminal can be reached.
#[test]
fn given_default_config_when_inspected_then_matches_documented_values() {
    let config = SocketConfig::default();

    assert_eq!(config.bind_ip().unwrap(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.port_range(), 3000..8000);
    assert_eq!(config.max_port_retries, 20);
    assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
    assert!(config.validate().is_ok());
}

/// **VALUE**: Verifies a missing config file yields defaults rather than an error.
///
/// **BUG THIS CATCHES**: Would catch first-run startup failing because no file exists yet.
#[test]
fn given_missing_file_when_load_then_returns_defaults() {
    let dir = TempDir::new().unwrap();

    let config = SocketConfig::load(dir.path()).unwrap();

    assert_eq!(config, SocketConfig::default());
}

/// **VALUE**: Verifies a saved config loads back unchanged and no temp file is left behind.
#[test]
fn given_saved_config_when_loaded_then_values_preserved() {
    let dir = TempDir::new().unwrap();
    let config = SocketConfig {
        port_range_start: 9000,
        port_range_end: 9100,
        max_port_retries: 5,
        ..SocketConfig::default()
    };

    config.save(dir.path()).unwrap();
    let loaded = SocketConfig::load(dir.path()).unwrap();

    assert_eq!(loaded, config);
    assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    assert!(!dir.path().join(format!("{CONFIG_FILE_NAME}.tmp")).exists());
}

/// **VALUE**: Verifies fields missing from the file take their defaults.
///
/// **WHY THIS MATTERS**: Users edit this file by hand and usually set one field.
#[test]
fn given_partial_file_when_load_then_missing_fields_defaulted() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "bind_host": "0.0.0.0" }"#,
    )
    .unwrap();

    let config = SocketConfig::load(dir.path()).unwrap();

    assert_eq!(config.bind_host, "0.0.0.0");
    assert_eq!(config.port_range(), 3000..8000);
}

/// **VALUE**: Verifies malformed JSON is reported as a parse error naming the file.
#[test]
fn given_invalid_json_when_load_then_parse_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();

    let result = SocketConfig::load(dir.path());

    match result {
        Err(ConfigError::ParseError { path, .. }) => {
            assert!(path.ends_with(CONFIG_FILE_NAME));
        }
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

/// **VALUE**: Verifies each invalid field is rejected by name.
///
/// **BUG THIS CATCHES**: Would catch an inverted or empty port range reaching the
/// allocator, where it would fail with a far less useful error.
#[test]
fn given_invalid_fields_when_validate_then_names_offending_field() {
    let cases: Vec<(SocketConfig, &str)> = vec![
        (
            SocketConfig {
                bind_host: "not-an-ip".into(),
                ..SocketConfig::default()
            },
            "bind_host",
        ),
        (
            SocketConfig {
                port_range_start: 0,
                ..SocketConfig::default()
            },
            "port_range_start",
        ),
        (
            SocketConfig {
                port_range_start: 8000,
                port_range_end: 8000,
                ..SocketConfig::default()
            },
            "port_range_end",
        ),
        (
            SocketConfig {
                max_port_retries: 0,
                ..SocketConfig::default()
            },
            "max_port_retries",
        ),
        (
            SocketConfig {
                max_request_head_bytes: 64,
                ..SocketConfig::default()
            },
            "max_request_head_bytes",
        ),
    ];

    for (config, expected) in cases {
        match config.validate() {
            Err(ConfigError::ValidationError { field, .. }) => assert_eq!(field, expected),
            other => panic!("Expected ValidationError for {expected}, got {other:?}"),
        }
    }
}

/// **VALUE**: Verifies an invalid config is never written to disk.
#[test]
fn given_invalid_config_when_save_then_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let config = SocketConfig {
        max_port_retries: 0,
        ..SocketConfig::default()
    };

    assert!(config.save(dir.path()).is_err());
    assert!(!dir.path().join(CONFIG_FILE_NAME).exists());
}
