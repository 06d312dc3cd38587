//! Test helpers for terminal socket integration tests.
//!
//! This module provides utilities for driving a real listener:
//! - Starting a socket and connecting clients to a handle
//! - Recording callback events through a channel
//! - Waiting for events with a timeout

use socket_core::socket::{ConnectionCallbacks, TerminalSocket};

use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound for anything the loop thread should do "promptly".
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Window in which an event must NOT arrive.
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Callback invocation observed by a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened,
    Input(String),
    Closed,
}

/// Test helper: Create a socket with its server already running.
pub fn running_socket() -> TerminalSocket {
    let socket = TerminalSocket::new();
    socket
        .ensure_server_running()
        .expect("Failed to start terminal socket");
    socket
}

/// Test helper: Callbacks that forward every invocation to a channel.
pub fn recording_callbacks() -> (ConnectionCallbacks, UnboundedReceiver<Event>) {
    let (tx, rx) = unbounded_channel();
    let opened = tx.clone();
    let input = tx.clone();
    let closed = tx;

    let callbacks = ConnectionCallbacks::new()
        .on_connection_opened(move || {
            let _ = opened.send(Event::Opened);
        })
        .on_received_input(move |payload| {
            let _ = input.send(Event::Input(payload.to_string()));
        })
        .on_connection_closed(move || {
            let _ = closed.send(Event::Closed);
        });

    (callbacks, rx)
}

/// Test helper: Connect a WebSocket client to `/terminal/{handle}/`.
pub async fn connect_terminal(port: u16, handle: &str) -> WsClient {
    let url = format!("ws://127.0.0.1:{port}/terminal/{handle}/");
    let (ws_stream, _) = timeout(EVENT_TIMEOUT, connect_async(&url))
        .await
        .expect("Timed out connecting to terminal socket")
        .expect("Failed to connect to terminal socket");
    ws_stream
}

/// Test helper: Next recorded event, failing the test on timeout.
pub async fn next_event(events: &mut UnboundedReceiver<Event>) -> Event {
    timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("Timed out waiting for callback")
        .expect("Callback channel closed")
}

/// Test helper: Assert that no event arrives within [`QUIET_PERIOD`].
pub async fn assert_no_event(events: &mut UnboundedReceiver<Event>) {
    if let Ok(Some(event)) = timeout(QUIET_PERIOD, events.recv()).await {
        panic!("Unexpected callback: {event:?}");
    }
}

/// Test helper: Next text frame the server sent to `ws`.
pub async fn next_text(ws: &mut WsClient) -> String {
    loop {
        let message = timeout(EVENT_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for frame")
            .expect("Connection ended")
            .expect("Error receiving frame");

        match message {
            Message::Text(text) => return text.to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Expected text frame, got {other:?}"),
        }
    }
}
