//! Callbacks the host registers for each terminal handle.

use socket_core::socket::{ConnectionCallbacks, TerminalSocket};

use std::sync::{Arc, Weak};

use log::{info, warn};

/// Build the callback set for `handle`.
///
/// Input is logged, and with `echo` written back to the same terminal. The
/// socket is held weakly so the registration does not keep it alive. If the
/// echo's upgraded `Arc` turns out to be the last one, the socket is dropped on
/// the loop thread, which only signals the loop to stop rather than joining it.
pub fn terminal_callbacks(
    socket: &Arc<TerminalSocket>,
    handle: &str,
    echo: bool,
) -> ConnectionCallbacks {
    let weak: Weak<TerminalSocket> = Arc::downgrade(socket);
    let input_handle = handle.to_owned();
    let opened_handle = handle.to_owned();
    let closed_handle = handle.to_owned();

    ConnectionCallbacks::new()
        .on_connection_opened(move || info!("Terminal '{opened_handle}' opened"))
        .on_received_input(move |input| {
            info!("Terminal '{input_handle}' received {} bytes", input.len());
            if !echo {
                return;
            }
            let Some(socket) = weak.upgrade() else {
                return;
            };
            if let Err(e) = socket.send_text(&input_handle, input) {
                warn!("Echo to terminal '{input_handle}' failed: {e}");
            }
        })
        .on_connection_closed(move || info!("Terminal '{closed_handle}' closed"))
}
