//! Per-terminal callback set.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use log::error;

/// Invoked with each inbound payload, unmodified.
pub type InputCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Invoked on connection open or close.
pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Callbacks a session layer registers for one terminal handle.
///
/// Every callback runs on the server loop thread with no registry lock held, so
/// a callback may call back into [`TerminalSocket`](crate::socket::TerminalSocket)
/// (`stop`, `send_text`, ...), except `stop_server`.
///
/// Whatever a closure captures must stay valid for as long as the handle stays
/// registered; the socket does not track it.
#[derive(Clone, Default)]
pub struct ConnectionCallbacks {
    pub on_received_input: Option<InputCallback>,
    pub on_connection_opened: Option<EventCallback>,
    pub on_connection_closed: Option<EventCallback>,
}

impl ConnectionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_received_input<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_received_input = Some(Arc::new(callback));
        self
    }

    pub fn on_connection_opened<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connection_opened = Some(Arc::new(callback));
        self
    }

    pub fn on_connection_closed<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connection_closed = Some(Arc::new(callback));
        self
    }

    pub(crate) fn received_input(&self, handle: &str, payload: &str) {
        if let Some(callback) = &self.on_received_input {
            guarded(handle, "on_received_input", || callback(payload));
        }
    }

    pub(crate) fn connection_opened(&self, handle: &str) {
        if let Some(callback) = &self.on_connection_opened {
            guarded(handle, "on_connection_opened", callback.as_ref());
        }
    }

    pub(crate) fn connection_closed(&self, handle: &str) {
        if let Some(callback) = &self.on_connection_closed {
            guarded(handle, "on_connection_closed", callback.as_ref());
        }
    }
}

/// Run a user callback, logging and swallowing any panic.
fn guarded(handle: &str, name: &str, callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        error!("Callback {name} for terminal '{handle}' panicked");
    }
}

impl fmt::Debug for ConnectionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCallbacks")
            .field("on_received_input", &self.on_received_input.is_some())
            .field("on_connection_opened", &self.on_connection_opened.is_some())
            .field("on_connection_closed", &self.on_connection_closed.is_some())
            .finish()
    }
}
