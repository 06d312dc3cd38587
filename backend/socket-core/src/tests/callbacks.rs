// Unit tests for callback dispatch.

use crate::socket::callbacks::ConnectionCallbacks;

use std::sync::{Arc, Mutex};

/// **VALUE**: Verifies inbound payloads reach the input callback unmodified.
#[test]
fn given_input_callback_when_received_input_then_payload_passed_verbatim() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callbacks = ConnectionCallbacks::new()
        .on_received_input(move |input| sink.lock().unwrap().push(input.to_string()));

    callbacks.received_input("abcd", "ls -la\r\n");
    callbacks.received_input("abcd", "");

    assert_eq!(*seen.lock().unwrap(), vec!["ls -la\r\n".to_string(), String::new()]);
}

/// **VALUE**: Verifies missing callbacks are simply skipped.
///
/// **BUG THIS CATCHES**: Would catch an `unwrap` on an absent optional callback.
#[test]
fn given_no_callbacks_when_events_dispatched_then_nothing_happens() {
    let callbacks = ConnectionCallbacks::default();

    callbacks.connection_opened("abcd");
    callbacks.received_input("abcd", "input");
    callbacks.connection_closed("abcd");
}

/// **VALUE**: Verifies a panicking callback does not unwind into the caller.
///
/// **WHY THIS MATTERS**: Callbacks run on the server loop thread. A panic escaping one
/// would kill the loop and disconnect every terminal, not just the faulty one.
///
/// **BUG THIS CATCHES**: Would catch removal of the `catch_unwind` guard.
#[test]
fn given_panicking_callback_when_dispatched_then_panic_contained() {
    let callbacks = ConnectionCallbacks::new()
        .on_connection_opened(|| panic!("session layer bug"))
        .on_connection_closed(|| panic!("session layer bug"));

    callbacks.connection_opened("abcd");
    callbacks.connection_closed("abcd");
}

/// **VALUE**: Verifies Debug output shows which callbacks are set without requiring
/// the closures themselves to be Debug.
#[test]
fn given_partial_callbacks_when_debug_formatted_then_reports_presence() {
    let callbacks = ConnectionCallbacks::new().on_received_input(|_| {});

    let debug = format!("{callbacks:?}");

    assert!(debug.contains("on_received_input: true"));
    assert!(debug.contains("on_connection_opened: false"));
}
