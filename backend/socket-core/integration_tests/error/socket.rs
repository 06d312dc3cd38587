use socket_core::error::CoreError;
use socket_core::error::socket::SocketError;
use socket_core::socket::TerminalSocket;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies `SocketError` variants carry file/line/column location tracking.
///
/// **WHY THIS MATTERS**: The same error kind (e.g. NotConnected) is raised from several
/// call sites. The location tells developers which one fired.
///
/// **BUG THIS CATCHES**: Would catch the location being dropped from the Display format.
#[test]
fn given_socket_error_when_formatted_then_includes_location() {
    // GIVEN: A PortExhausted error with location
    let location = ErrorLocation::from(Location::caller());
    let err = SocketError::PortExhausted {
        message: "Couldn't find an available port".to_string(),
        location,
    };

    // WHEN: Formatting the error as string
    let error_string = format!("{}", err);

    // THEN: Should include error type, message, and file location
    assert!(error_string.contains("Port Exhausted Error"));
    assert!(error_string.contains("Couldn't find an available port"));
    assert!(error_string.contains("socket.rs"));
}

/// **VALUE**: Verifies errors raised by the public API point at the library call site.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[track_caller]` on the error constructors,
/// which would make every NotConnected point at the same helper line.
#[test]
fn given_listen_before_start_when_error_formatted_then_names_handle_and_location() {
    let socket = TerminalSocket::new();

    let err = socket
        .listen("abcd", Default::default())
        .expect_err("listen must fail before start");

    let error_string = err.to_string();
    assert!(error_string.starts_with("Not Connected Error"));
    assert!(error_string.contains("'abcd'"));
    assert!(error_string.contains("terminal_socket.rs"));
}

/// **VALUE**: Verifies `CoreError` wraps socket errors transparently.
#[test]
fn given_socket_error_when_converted_to_core_error_then_display_unchanged() {
    let err = SocketError::UnknownHandle {
        message: "No terminal registered for handle 'wxyz'".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };
    let expected = err.to_string();

    let core: CoreError = err.into();

    assert_eq!(core.to_string(), expected);
}
