// Unit tests for command-line parsing.

use crate::cli::{APP_DIR_NAME, Cli};

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

/// **VALUE**: Verifies the clap definition is internally consistent.
///
/// **BUG THIS CATCHES**: Would catch duplicate flags or conflicting attributes, which clap
/// only reports at runtime when the binary starts.
#[test]
fn given_cli_definition_when_debug_asserted_then_valid() {
    Cli::command().debug_assert();
}

/// **VALUE**: Verifies `--handle` is repeatable and order-preserving.
///
/// **WHY THIS MATTERS**: One host serves several terminals; dropping all but the last
/// handle would leave the others unreachable.
#[test]
fn given_repeated_handle_flags_when_parsed_then_all_handles_kept() {
    let cli = Cli::try_parse_from([
        "terminal-host",
        "--handle",
        "abcd",
        "--handle",
        "efgh",
        "--echo",
    ])
    .unwrap();

    assert_eq!(cli.handles, vec!["abcd".to_string(), "efgh".to_string()]);
    assert!(cli.echo);
}

/// **VALUE**: Verifies the log directory falls back to the config directory.
#[test]
fn given_only_config_dir_when_resolved_then_log_dir_matches() {
    let cli = Cli::try_parse_from(["terminal-host", "--config-dir", "/tmp/th-config"]).unwrap();

    assert_eq!(cli.config_dir().unwrap(), PathBuf::from("/tmp/th-config"));
    assert_eq!(cli.log_dir().unwrap(), PathBuf::from("/tmp/th-config"));
    assert!(!cli.echo);
    assert!(cli.handles.is_empty());
}

/// **VALUE**: Verifies an explicit log directory wins over the config directory.
#[test]
fn given_both_dirs_when_resolved_then_each_used() {
    let cli = Cli::try_parse_from([
        "terminal-host",
        "--config-dir",
        "/tmp/th-config",
        "--log-dir",
        "/tmp/th-logs",
    ])
    .unwrap();

    assert_eq!(cli.log_dir().unwrap(), PathBuf::from("/tmp/th-logs"));
}

/// **VALUE**: Verifies the default config directory lives under the platform config dir.
#[test]
fn given_no_config_dir_when_resolved_then_uses_platform_default() {
    let cli = Cli {
        config_dir: None,
        log_dir: None,
        handles: Vec::new(),
        echo: false,
    };

    match (cli.config_dir(), dirs::config_dir()) {
        (Ok(dir), Some(platform)) => assert_eq!(dir, platform.join(APP_DIR_NAME)),
        (Err(_), None) => {}
        (resolved, platform) => panic!("Mismatch: {resolved:?} vs {platform:?}"),
    }
}
