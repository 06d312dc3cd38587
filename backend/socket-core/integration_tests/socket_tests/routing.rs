use crate::socket_tests::helpers::{
    Event, QUIET_PERIOD, assert_no_event, connect_terminal, next_event, next_text,
    recording_callbacks, running_socket,
};

use socket_core::error::socket::SocketError;
use socket_core::socket::{ConnectionCallbacks, DIAGNOSTIC_BODY, TerminalSocket};

use std::sync::{Arc, Weak};

use futures_util::SinkExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;

/// **VALUE**: Verifies the full terminal round trip: open, input, output, close.
///
/// **WHY THIS MATTERS**: This is the path every keystroke and every byte of terminal output
/// takes. Open must precede input, input must arrive exactly once and unmodified, and
/// close must fire exactly once.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Input delivered before `on_connection_opened`
/// - Duplicate delivery of a frame
/// - Payload trimming or re-encoding
/// - `send_text` not reaching the client
/// - Missing or duplicated `on_connection_closed`
#[tokio::test]
async fn given_connected_terminal_when_input_sent_then_callbacks_fire_in_order() {
    // GIVEN: A registered handle and a connected client
    let socket = running_socket();
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    let mut ws = connect_terminal(socket.port(), "abcd").await;

    // WHEN: Client sends text
    ws.send(Message::text("Hello World!")).await.unwrap();

    // THEN: Opened, then the input exactly once
    assert_eq!(next_event(&mut events).await, Event::Opened);
    assert_eq!(
        next_event(&mut events).await,
        Event::Input("Hello World!".to_string())
    );
    assert_no_event(&mut events).await;

    // WHEN: Server writes back
    socket.send_text("abcd", "user@host:~$ ").unwrap();

    // THEN: Client receives it verbatim
    assert_eq!(next_text(&mut ws).await, "user@host:~$ ");

    // WHEN: Client closes
    ws.close(None).await.unwrap();

    // THEN: Closed fires once; the record survives without a connection
    assert_eq!(next_event(&mut events).await, Event::Closed);
    assert_no_event(&mut events).await;
    assert_eq!(socket.connection_count(), 1);
    assert!(matches!(
        socket.send_text("abcd", "anyone?"),
        Err(SocketError::NotConnected { .. })
    ));

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies UTF-8 binary frames are delivered like text frames.
///
/// **WHY THIS MATTERS**: Some terminal clients send keystrokes as binary frames.
#[tokio::test]
async fn given_utf8_binary_frame_when_sent_then_delivered_as_input() {
    let socket = running_socket();
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    let mut ws = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);

    ws.send(Message::binary(b"\x1b[A".to_vec())).await.unwrap();
    ws.send(Message::binary(vec![0xff, 0xfe])).await.unwrap();
    ws.send(Message::text("after")).await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        Event::Input("\x1b[A".to_string())
    );
    assert_eq!(
        next_event(&mut events).await,
        Event::Input("after".to_string()),
        "non-UTF-8 binary frame is dropped"
    );

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies two terminals on one listener never see each other's traffic.
///
/// **WHY THIS MATTERS**: The listener is shared by every terminal. Crossed routing would
/// type one user's keystrokes into another user's shell.
#[tokio::test]
async fn given_two_terminals_when_both_send_then_each_receives_only_its_own() {
    let socket = running_socket();
    let (callbacks_a, mut events_a) = recording_callbacks();
    let (callbacks_b, mut events_b) = recording_callbacks();
    socket.listen("aaaa", callbacks_a).unwrap();
    socket.listen("bbbb", callbacks_b).unwrap();
    let mut ws_a = connect_terminal(socket.port(), "aaaa").await;
    let mut ws_b = connect_terminal(socket.port(), "bbbb").await;
    assert_eq!(next_event(&mut events_a).await, Event::Opened);
    assert_eq!(next_event(&mut events_b).await, Event::Opened);

    ws_a.send(Message::text("from a")).await.unwrap();
    ws_b.send(Message::text("from b")).await.unwrap();
    socket.send_text("bbbb", "to b").unwrap();
    socket.send_text("aaaa", "to a").unwrap();

    assert_eq!(
        next_event(&mut events_a).await,
        Event::Input("from a".to_string())
    );
    assert_eq!(
        next_event(&mut events_b).await,
        Event::Input("from b".to_string())
    );
    assert_eq!(next_text(&mut ws_a).await, "to a");
    assert_eq!(next_text(&mut ws_b).await, "to b");
    assert_no_event(&mut events_a).await;
    assert_no_event(&mut events_b).await;

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies a client for an unregistered handle stays connected but unbound.
///
/// **BUG THIS CATCHES**: Would catch the server auto-registering arbitrary handles, or
/// routing unbound input to some other terminal.
#[tokio::test]
async fn given_unregistered_handle_when_client_connects_then_no_record_and_no_routing() {
    let socket = running_socket();
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();

    let mut ws = connect_terminal(socket.port(), "zzzz").await;
    ws.send(Message::text("lost")).await.unwrap();

    assert_no_event(&mut events).await;
    assert_eq!(socket.connection_count(), 1);
    assert!(matches!(
        socket.send_text("zzzz", "nobody"),
        Err(SocketError::NotConnected { .. })
    ));

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies `stop` detaches a connected handle: later input and close are dropped.
#[tokio::test]
async fn given_connected_handle_when_stopped_then_later_events_dropped() {
    let socket = running_socket();
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    let mut ws = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);

    socket.stop("abcd").unwrap();
    ws.send(Message::text("ignored")).await.unwrap();
    ws.close(None).await.unwrap();

    assert_no_event(&mut events).await;
    assert_eq!(socket.connection_count(), 0);

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies callbacks may call back into the socket from the loop thread.
///
/// **WHY THIS MATTERS**: An echoing terminal writes output from inside its input callback.
/// If callbacks ran with the registry lock held, this would deadlock the loop.
#[tokio::test]
async fn given_echo_callback_when_input_sent_then_echo_reaches_client() {
    let socket = Arc::new(running_socket());
    let weak: Weak<TerminalSocket> = Arc::downgrade(&socket);
    socket
        .listen(
            "abcd",
            ConnectionCallbacks::new().on_received_input(move |input| {
                if let Some(socket) = weak.upgrade() {
                    socket.send_text("abcd", &format!("echo: {input}")).unwrap();
                }
            }),
        )
        .unwrap();
    let mut ws = connect_terminal(socket.port(), "abcd").await;

    ws.send(Message::text("pwd")).await.unwrap();

    assert_eq!(next_text(&mut ws).await, "echo: pwd");
    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies a plain HTTP request gets the diagnostic page.
///
/// **WHY THIS MATTERS**: Pointing a browser at the port is the quickest way to check the
/// server is alive; a non-upgrade request must not hang or crash the loop.
#[tokio::test]
async fn given_plain_http_request_when_sent_then_diagnostic_page_returned() {
    let socket = running_socket();
    let mut stream = TcpStream::connect(("127.0.0.1", socket.port()))
        .await
        .unwrap();

    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    tokio::time::timeout(
        crate::socket_tests::helpers::EVENT_TIMEOUT,
        stream.read_to_string(&mut response),
    )
    .await
    .expect("Server should close after the diagnostic page")
    .unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "got: {response}");
    assert!(response.ends_with(DIAGNOSTIC_BODY));

    // The loop keeps serving WebSocket clients afterwards
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    let _ws = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies a handle accepts a new connection after the previous one closed,
/// reusing the same callbacks.
///
/// **WHY THIS MATTERS**: Records outlive their connections so a terminal client can drop
/// and reconnect (page reload, network blip) without the session registering again.
///
/// **BUG THIS CATCHES**: Would catch the record being removed on close, or the old
/// connection staying attached so the new one is never bound.
#[tokio::test]
async fn given_closed_connection_when_client_reconnects_then_opened_again_and_output_flows() {
    // GIVEN: A client that connected and then closed
    let socket = running_socket();
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    let mut first = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);
    first.close(None).await.unwrap();
    assert_eq!(next_event(&mut events).await, Event::Closed);

    // WHEN: A new client connects to the same handle
    let mut second = connect_terminal(socket.port(), "abcd").await;

    // THEN: Opened fires again and both directions work
    assert_eq!(next_event(&mut events).await, Event::Opened);
    second.send(Message::text("again")).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        Event::Input("again".to_string())
    );
    socket.send_text("abcd", "welcome back").unwrap();
    assert_eq!(next_text(&mut second).await, "welcome back");

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies a connection opened before `listen` stays unbound afterwards.
///
/// **WHY THIS MATTERS**: The session only hears from a connection after
/// `on_connection_opened`. A connection that never got that event must not feed input or
/// a close into the session, since `send_text` cannot reach it either.
///
/// **BUG THIS CATCHES**: Would catch input and close being routed by the path's handle
/// instead of by which connection is bound to the record.
#[tokio::test]
async fn given_connection_opened_before_listen_when_it_sends_and_closes_then_no_callbacks() {
    // GIVEN: A client connected to a handle nobody has registered yet
    let socket = running_socket();
    let mut early = connect_terminal(socket.port(), "abcd").await;
    tokio::time::sleep(QUIET_PERIOD).await;

    // WHEN: The handle is registered afterwards and the early client talks, then closes
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    early.send(Message::text("early")).await.unwrap();

    // THEN: Nothing is delivered, and output is refused consistently
    assert_no_event(&mut events).await;
    assert!(matches!(
        socket.send_text("abcd", "hello?"),
        Err(SocketError::NotConnected { .. })
    ));

    early.close(None).await.unwrap();
    assert_no_event(&mut events).await;

    // AND: A fresh connection binds normally
    let _bound = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);

    socket.stop_server().unwrap();
}

/// **VALUE**: Verifies a replaced connection is silenced and its close is not reported.
///
/// **WHY THIS MATTERS**: When a client reconnects before the old socket is torn down, the
/// newer connection owns the terminal. Reporting the old close would make the session
/// mark a live terminal as disconnected.
///
/// **BUG THIS CATCHES**: Would catch:
/// - `on_connection_closed` firing for a connection that is no longer bound
/// - Input from the replaced connection still reaching the session
/// - The old close detaching the newer connection
#[tokio::test]
async fn given_replaced_connection_when_it_sends_and_closes_then_newer_connection_unaffected() {
    // GIVEN: Connection A replaced by connection B on the same handle
    let socket = running_socket();
    let (callbacks, mut events) = recording_callbacks();
    socket.listen("abcd", callbacks).unwrap();
    let mut ws_a = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);
    let mut ws_b = connect_terminal(socket.port(), "abcd").await;
    assert_eq!(next_event(&mut events).await, Event::Opened);

    // WHEN: A sends and closes
    ws_a.send(Message::text("from a")).await.unwrap();
    ws_a.close(None).await.unwrap();

    // THEN: No input and no close reported
    assert_no_event(&mut events).await;

    // AND: B still owns the terminal in both directions
    socket.send_text("abcd", "to b").unwrap();
    assert_eq!(next_text(&mut ws_b).await, "to b");
    ws_b.send(Message::text("from b")).await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        Event::Input("from b".to_string())
    );

    // WHEN: B closes
    ws_b.close(None).await.unwrap();

    // THEN: Exactly one close, for B
    assert_eq!(next_event(&mut events).await, Event::Closed);
    assert_no_event(&mut events).await;

    socket.stop_server().unwrap();
}
