//! Terminal socket accept/event loop.
//!
//! The loop runs on one dedicated OS thread driving a current-thread tokio
//! runtime. Every accepted connection becomes a task on that same runtime, so
//! all open/message/close handling happens on the loop thread:
//!
//! ```text
//! accept ─▶ read request head ─┬─ plain request ─▶ 200 diagnostic page, close
//!                              └─ upgrade ─▶ 101 ─▶ extract handle
//!                                                    ├─ bind LiveConnection, on_connection_opened
//!                                                    ├─ frames ─▶ on_received_input (while bound)
//!                                                    └─ close ─▶ unbind, on_connection_closed (if still bound)
//! ```
//!
//! Errors from a single connection are logged where its task ends and never
//! reach the accept loop.

use crate::config::SocketConfig;
use crate::error::socket::SocketError;
use crate::socket::http::{
    RequestKind, diagnostic_response, read_request_head, switching_protocols_response,
};
use crate::socket::path::extract_handle;
use crate::socket::registry::{ConnectionRegistry, LiveConnection};
use crate::socket::server_handle::ServerHandle;

use common::ErrorLocation;

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::panic::Location;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};
use tokio::spawn as TokioSpawn;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep as TokioSleep, timeout};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::Role;
use uuid::Uuid;

const LOOP_THREAD_NAME: &str = "terminal-socket";
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// State every connection task needs.
#[derive(Clone)]
struct LoopContext {
    registry: ConnectionRegistry,
    config: Arc<SocketConfig>,
}

/// Start the loop thread on an already-bound listener.
///
/// Returns once the loop thread has built its runtime and registered the
/// listener; on failure the thread has already exited and nothing stays bound.
///
/// # Errors
///
/// Returns [`SocketError::Io`] if the runtime cannot be built, the listener
/// cannot be registered with it, or the thread cannot be spawned.
pub(crate) fn spawn(
    listener: StdTcpListener,
    registry: ConnectionRegistry,
    config: SocketConfig,
) -> Result<ServerHandle, SocketError> {
    let local_addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), SocketError>>();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let context = LoopContext {
        registry,
        config: Arc::new(config),
    };

    let thread = std::thread::Builder::new()
        .name(LOOP_THREAD_NAME.to_string())
        .spawn(move || {
            let (runtime, listener) = match build_runtime(listener) {
                Ok(started) => started,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            runtime.block_on(accept_loop(listener, shutdown_rx, context));
            // Dropping the runtime cancels every connection task and closes its socket.
            drop(runtime);
            debug!("Terminal socket runtime on {local_addr} dropped");
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => {
            info!("Terminal socket loop started on {local_addr}");
            Ok(ServerHandle::new(local_addr, shutdown_tx, thread))
        }
        Ok(Err(e)) => {
            let _ = thread.join();
            Err(e)
        }
        Err(_) => {
            let _ = thread.join();
            Err(SocketError::Io {
                message: format!("Terminal socket loop on {local_addr} exited during startup"),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}

fn build_runtime(listener: StdTcpListener) -> Result<(Runtime, TcpListener), SocketError> {
    let runtime = RuntimeBuilder::new_current_thread().enable_all().build()?;
    let listener = {
        let _guard = runtime.enter();
        TcpListener::from_std(listener)?
    };
    Ok((runtime, listener))
}

async fn accept_loop(
    listener: TcpListener,
    mut shutdown_rx: oneshot::Receiver<()>,
    context: LoopContext,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                info!("Terminal socket loop shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {peer}");
                    let context = context.clone();
                    TokioSpawn(async move {
                        if let Err(e) = handle_connection(stream, peer, context).await {
                            warn!("Connection from {peer} ended with error: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {e}");
                    TokioSleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }
    }
}

/// Route one accepted TCP connection.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    context: LoopContext,
) -> Result<(), SocketError> {
    let head = timeout(
        context.config.handshake_timeout(),
        read_request_head(&mut stream, context.config.max_request_head_bytes),
    )
    .await
    .map_err(|_| SocketError::Handshake {
        message: format!("Timed out waiting for request head from {peer}"),
        location: ErrorLocation::from(Location::caller()),
    })??;

    let Some(head) = head else {
        debug!("Connection from {peer} closed before sending a request");
        return Ok(());
    };

    match head.kind {
        RequestKind::Plain { method, path } => {
            info!("Serving diagnostics to {peer} for {method} {path}");
            stream.write_all(diagnostic_response().as_bytes()).await?;
            stream.shutdown().await?;
            Ok(())
        }
        RequestKind::Upgrade { path, key } => {
            stream
                .write_all(switching_protocols_response(&key).as_bytes())
                .await?;
            let ws_stream =
                WebSocketStream::from_partially_read(stream, head.trailing, Role::Server, None)
                    .await;
            serve_terminal(ws_stream, peer, &path, context).await;
            Ok(())
        }
    }
}

/// Bind an upgraded connection to its terminal handle and pump its frames.
async fn serve_terminal(
    ws_stream: WebSocketStream<TcpStream>,
    peer: SocketAddr,
    path: &str,
    context: LoopContext,
) {
    let (mut write, mut read) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    let writer = TokioSpawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if let Err(e) = write.send(message).await {
                warn!("Failed to send frame to {peer}: {e}");
                break;
            }
        }
        let _ = write.close().await;
    });

    let live = LiveConnection::new(peer, outbound_tx);
    let connection_id = live.id();

    // Only a connection that won `bind_live` talks to the handle's callbacks.
    let bound = match extract_handle(path) {
        Some(handle) => match context.registry.bind_live(handle, live.clone()) {
            Some(callbacks) => {
                info!("Terminal '{handle}' connected from {peer} ({connection_id})");
                callbacks.connection_opened(handle);
                Some(handle.to_owned())
            }
            None => {
                warn!("No terminal registered for '{handle}'; {peer} left unbound");
                None
            }
        },
        None => {
            warn!("No terminal handle in path '{path}'; {peer} left unbound");
            None
        }
    };

    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                deliver(&context, bound.as_deref(), connection_id, text.as_str())
            }
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => deliver(&context, bound.as_deref(), connection_id, text),
                Err(_) => warn!("Dropping non-UTF-8 binary frame from {peer}"),
            },
            Ok(Message::Close(frame)) => debug!("Close frame from {peer}: {frame:?}"),
            Ok(_) => {}
            Err(e) => {
                warn!("Error reading from {peer}: {e}");
                break;
            }
        }
    }

    if let Some(handle) = bound.as_deref() {
        match context.registry.unbind_live(handle, connection_id) {
            Some(callbacks) => {
                info!("Terminal '{handle}' disconnected ({connection_id})");
                callbacks.connection_closed(handle);
            }
            None => debug!("Connection {connection_id} closed while no longer bound to '{handle}'"),
        }
    }

    drop(live);
    writer.abort();
}

fn deliver(context: &LoopContext, handle: Option<&str>, connection_id: Uuid, payload: &str) {
    let Some(handle) = handle else {
        return;
    };

    match context.registry.callbacks_if_bound(handle, connection_id) {
        Some(callbacks) => callbacks.received_input(handle, payload),
        None => debug!(
            "Dropping {} bytes from {connection_id}: no longer bound to '{handle}'",
            payload.len()
        ),
    }
}
