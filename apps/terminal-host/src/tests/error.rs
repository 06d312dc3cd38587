// Unit tests for HostError conversions.

use crate::error::HostError;

use common::ErrorLocation;

use socket_core::error::config::ConfigError;
use socket_core::error::socket::SocketError;

use std::panic::Location;

/// **VALUE**: Verifies socket errors keep their message when converted for the host.
///
/// **WHY THIS MATTERS**: `main` returns `HostError`; if the conversion dropped the socket
/// message, a failed start would only say "Socket Error" with no reason.
///
/// **BUG THIS CATCHES**: Would catch a conversion that discards the original Display text.
#[test]
fn given_socket_error_when_converted_then_message_preserved() {
    // GIVEN: A PortExhausted error
    let err = SocketError::PortExhausted {
        message: "Couldn't find an available port".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Converting to HostError
    let host: HostError = err.into();

    // THEN: Socket variant carrying the original message
    let error_string = host.to_string();
    assert!(matches!(host, HostError::Socket { .. }));
    assert!(error_string.starts_with("Socket Error"));
    assert!(error_string.contains("Couldn't find an available port"));
}

/// **VALUE**: Verifies config errors map to the Config variant.
#[test]
fn given_config_error_when_converted_then_config_variant() {
    let err = ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        field: "bind_host",
        reason: "'nope': invalid IP address syntax".to_string(),
    };

    let host: HostError = err.into();

    assert!(matches!(host, HostError::Config { ref message, .. } if message.contains("bind_host")));
}
