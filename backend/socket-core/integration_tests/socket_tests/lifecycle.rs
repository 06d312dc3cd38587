use crate::socket_tests::helpers::{
    Event, connect_terminal, next_event, recording_callbacks, running_socket,
};

use socket_core::config::SocketConfig;
use socket_core::error::socket::SocketError;
use socket_core::socket::{ConnectionCallbacks, TerminalSocket};

use std::net::TcpListener as StdTcpListener;
use std::sync::{Arc, Mutex};

/// **VALUE**: Verifies a freshly created socket reports nothing bound and nothing registered.
///
/// **WHY THIS MATTERS**: Callers use `port() == 0` to decide whether to start the server.
/// A stale or random value would make them skip startup.
#[test]
fn given_new_socket_when_queried_then_port_and_count_are_zero() {
    let socket = TerminalSocket::new();

    assert_eq!(socket.port(), 0);
    assert_eq!(socket.connection_count(), 0);
    assert!(!socket.is_running());
    assert!(socket.local_addr().is_none());
}

/// **VALUE**: Verifies handles cannot be registered before the server is running.
///
/// **BUG THIS CATCHES**: Would catch `listen` silently registering a handle no client
/// could ever reach.
#[test]
fn given_stopped_server_when_listen_then_not_connected() {
    let socket = TerminalSocket::new();

    let result = socket.listen("abcd", ConnectionCallbacks::new());

    assert!(matches!(result, Err(SocketError::NotConnected { .. })));
    assert_eq!(socket.connection_count(), 0);
}

/// **VALUE**: Verifies starting binds a port in the default range, is idempotent, and
/// stopping releases it.
///
/// **WHY THIS MATTERS**: Every terminal shares one listener. A second start that rebinds
/// would strand clients already connected to the first port.
///
/// **BUG THIS CATCHES**: Would catch `ensure_server_running` starting a second loop, or
/// `stop_server` leaving the port reported as bound.
#[test]
fn given_running_server_when_started_again_then_port_unchanged_and_stop_resets() {
    // GIVEN: A running server
    let socket = running_socket();
    let port = socket.port();
    assert!((3000..8000).contains(&port), "port {port} outside default range");

    // WHEN: Starting again
    socket.ensure_server_running().unwrap();

    // THEN: Same port
    assert_eq!(socket.port(), port);

    // WHEN: Stopping
    socket.stop_server().unwrap();

    // THEN: Nothing bound; stopping again is a no-op
    assert_eq!(socket.port(), 0);
    assert!(!socket.is_running());
    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies the server can be restarted after a stop, with registrations cleared.
#[test]
fn given_stopped_server_when_restarted_then_running_with_no_registrations() {
    let socket = running_socket();
    socket.listen("abcd", ConnectionCallbacks::new()).unwrap();
    socket.stop_server().unwrap();
    assert_eq!(socket.connection_count(), 0, "stop_server drops registrations");

    socket.ensure_server_running().unwrap();

    assert!(socket.is_running());
    assert_ne!(socket.port(), 0);
    assert_eq!(socket.connection_count(), 0);
    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies listen/stop/stop_all keep the registration count exact.
///
/// **BUG THIS CATCHES**: Would catch duplicate records on re-listen, or `stop` of an
/// unknown handle removing something anyway.
#[test]
fn given_registered_handles_when_stopped_then_count_decreases() {
    let socket = running_socket();
    socket.listen("aaaa", ConnectionCallbacks::new()).unwrap();
    socket.listen("bbbb", ConnectionCallbacks::new()).unwrap();
    socket.listen("bbbb", ConnectionCallbacks::new()).unwrap();
    assert_eq!(socket.connection_count(), 2);
    assert_eq!(socket.port_for("aaaa"), socket.port());

    socket.stop("aaaa").unwrap();
    assert_eq!(socket.connection_count(), 1);
    assert_eq!(socket.port_for("aaaa"), 0);

    assert!(matches!(
        socket.stop("aaaa"),
        Err(SocketError::UnknownHandle { .. })
    ));
    assert_eq!(socket.connection_count(), 1);

    socket.stop_all().unwrap();
    assert_eq!(socket.connection_count(), 0);
    assert!(socket.is_running(), "stop_all keeps the server running");
    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies an empty handle is rejected.
///
/// **WHY THIS MATTERS**: No request path can carry an empty handle, so such a
/// registration could never be reached.
#[test]
fn given_empty_handle_when_listen_then_unknown_handle() {
    let socket = running_socket();

    let result = socket.listen("", ConnectionCallbacks::new());

    assert!(matches!(result, Err(SocketError::UnknownHandle { .. })));
    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies port exhaustion against a real occupied port.
///
/// **WHY THIS MATTERS**: On a busy machine the allocator must give up cleanly and leave
/// the socket stopped rather than hang or half-start.
///
/// **BUG THIS CATCHES**: Would catch `AddrInUse` being reported as `BindFailed`, or a
/// failed start leaving `is_running()` true.
#[test]
fn given_only_candidate_port_occupied_when_started_then_port_exhausted() {
    // GIVEN: The only port in range is already bound
    let blocker = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let taken = blocker.local_addr().unwrap().port();
    let config = SocketConfig {
        port_range_start: taken,
        port_range_end: taken + 1,
        max_port_retries: 3,
        ..SocketConfig::default()
    };
    let socket = TerminalSocket::with_config(config);

    // WHEN: Starting
    let result = socket.ensure_server_running();

    // THEN: Exhausted, and nothing is running
    assert!(
        matches!(result, Err(SocketError::PortExhausted { .. })),
        "got {result:?}"
    );
    assert!(!socket.is_running());
    assert_eq!(socket.port(), 0);
}

/// **VALUE**: Verifies `stop_server` with a client attached fires no further callbacks and
/// releases the client.
///
/// **WHY THIS MATTERS**: Shutdown drops every registration first, so session layers must
/// not receive events for terminals they no longer own.
#[tokio::test]
async fn given_connected_client_when_stop_server_then_client_released_without_callbacks() {
    use futures_util::StreamExt;

    let socket = running_socket();
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    let mut ws = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);

    socket.stop_server().unwrap();

    let ended = tokio::time::timeout(crate::socket_tests::helpers::EVENT_TIMEOUT, ws.next())
        .await
        .expect("Client should be released after stop_server");
    assert!(!matches!(ended, Some(Ok(tokio_tungstenite::tungstenite::Message::Text(_)))));
    assert!(events.try_recv().is_err(), "no callbacks after stop_server");
}

/// **VALUE**: Verifies dropping the last socket reference inside a callback shuts the loop
/// down instead of failing.
///
/// **WHY THIS MATTERS**: Callbacks commonly hold a `Weak` to the socket and upgrade it to
/// reply. If that upgraded `Arc` is the last one, `Drop` runs on the loop thread, which
/// cannot join itself.
///
/// **BUG THIS CATCHES**: Would catch `Drop` deadlocking on a self-join, or leaving the
/// listener serving clients after the socket is gone.
#[tokio::test]
async fn given_last_reference_dropped_in_callback_when_input_arrives_then_loop_stops() {
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    // GIVEN: The only strong reference lives in a slot the callback empties
    let socket = Arc::new(running_socket());
    let weak = Arc::downgrade(&socket);
    let slot = Arc::new(Mutex::new(None::<Arc<TerminalSocket>>));
    let callback_slot = Arc::clone(&slot);
    socket
        .listen(
            "abcd",
            ConnectionCallbacks::new().on_received_input(move |_| {
                let last = callback_slot.lock().unwrap().take();
                drop(last);
            }),
        )
        .unwrap();
    let mut ws = connect_terminal(socket.port(), "abcd").await;
    *slot.lock().unwrap() = Some(socket);

    // WHEN: Input makes the callback drop the last reference on the loop thread
    ws.send(Message::text("bye")).await.unwrap();

    // THEN: The client is released and the socket is gone
    let ended = tokio::time::timeout(crate::socket_tests::helpers::EVENT_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(_))) | Some(Ok(Message::Ping(_))) => continue,
                other => break other,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "client should be released once the loop stops");
    assert!(weak.upgrade().is_none());
}
