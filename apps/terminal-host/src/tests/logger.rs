// Unit tests for logger setup
// Tests focus on idempotence and error handling

use crate::error::HostError;
use crate::logger::{LOG_FILE_NAME, dispatch, initialize};

use std::path::PathBuf;

use tempfile::TempDir;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Tests and the binary may both initialize logging. If the second
/// call errored, startup would fail for a harmless reason.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when setting a global logger twice.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = TempDir::new().unwrap();

    // WHEN: Calling initialize twice
    let result1 = initialize(temp_dir.path());
    let result2 = initialize(temp_dir.path());

    // THEN: Both should return Ok (second one logs warning but doesn't error)
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
}

/// **VALUE**: Verifies an unwritable log directory is an error, not a panic.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` being unwrapped.
#[test]
fn given_invalid_log_dir_when_dispatch_built_then_returns_host_error() {
    // GIVEN: A path under a regular file, which can never be a directory
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Building the dispatch
    let result = dispatch(&invalid_dir);

    // THEN: Host error naming the log file
    match result {
        Err(HostError::Host { message, .. }) => assert!(message.contains(LOG_FILE_NAME)),
        Err(other) => panic!("Expected HostError::Host, got {other:?}"),
        Ok(_) => panic!("Expected an error for {}", invalid_dir.display()),
    }
}

/// **VALUE**: Verifies building the dispatch creates the log file in the given directory.
#[test]
fn given_valid_log_dir_when_dispatch_built_then_log_file_created() {
    let temp_dir = TempDir::new().unwrap();

    let result = dispatch(temp_dir.path());

    assert!(result.is_ok());
    assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
}
