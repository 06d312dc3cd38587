use socket_core::config::{CONFIG_FILE_NAME, SocketConfig};
use socket_core::error::config::ConfigError;

use std::error::Error;

use tempfile::TempDir;

/// **VALUE**: Verifies read/parse errors name the offending file.
///
/// **WHY THIS MATTERS**: Users fix config problems by editing the file; the message must
/// say which file, not just that parsing failed.
#[test]
fn given_broken_config_file_when_loaded_then_error_names_path() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[1, 2").unwrap();

    let err = SocketConfig::load(dir.path()).unwrap_err();

    let error_string = err.to_string();
    assert!(error_string.starts_with("Socket Config Parse Error"));
    assert!(error_string.contains(CONFIG_FILE_NAME));
}

/// **VALUE**: Verifies I/O failures keep the underlying error as `source()`.
///
/// **BUG THIS CATCHES**: Would catch the `#[source]` attribute being removed, which loses
/// the OS error in error-chain reports.
#[test]
fn given_config_path_is_directory_when_loaded_then_read_error_has_source() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(CONFIG_FILE_NAME)).unwrap();

    let err = SocketConfig::load(dir.path()).unwrap_err();

    assert!(matches!(err, ConfigError::ReadError { .. }), "got {err:?}");
    assert!(err.source().is_some());
}

/// **VALUE**: Verifies validation errors name the field and the reason.
#[test]
fn given_inverted_port_range_when_validated_then_error_names_field() {
    let config = SocketConfig {
        port_range_start: 7000,
        port_range_end: 6000,
        ..SocketConfig::default()
    };

    let error_string = config.validate().unwrap_err().to_string();

    assert!(error_string.contains("port_range_end"));
    assert!(error_string.contains("7000"));
}
