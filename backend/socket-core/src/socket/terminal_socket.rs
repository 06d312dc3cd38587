//! Public API of the terminal socket multiplexer.

use crate::config::SocketConfig;
use crate::error::socket::SocketError;
use crate::socket::callbacks::ConnectionCallbacks;
use crate::socket::port_allocator::PortAllocator;
use crate::socket::registry::ConnectionRegistry;
use crate::socket::server;
use crate::socket::server_handle::ServerHandle;

use common::ErrorLocation;

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::panic::Location;
use std::sync::{Mutex, MutexGuard};

use log::{error, info};

/// One listening WebSocket endpoint shared by many terminal sessions.
///
/// Sessions register a handle with [`listen`](Self::listen); a client that
/// connects to `ws://host:port/.../<handle>/` is routed to that handle's
/// callbacks, and [`send_text`](Self::send_text) writes back down the same
/// connection.
///
/// All methods take `&self`, so the socket can be shared across threads in an
/// `Arc` and called from inside its own callbacks. The one exception is
/// [`stop_server`](Self::stop_server), which joins the loop thread and
/// therefore refuses to run on it.
///
/// # Lifecycle
///
/// `Stopped -> Starting -> Running -> Stopping -> Stopped`. Starting is atomic:
/// [`ensure_server_running`](Self::ensure_server_running) either leaves the
/// server running or leaves nothing bound. Call
/// [`stop_server`](Self::stop_server) before dropping; `Drop` falls back to
/// it and only logs failures. When the last reference is dropped inside a
/// callback, `Drop` signals the loop to stop without joining it.
///
/// # Examples
///
/// ```no_run
/// use socket_core::socket::{ConnectionCallbacks, TerminalSocket};
///
/// let socket = TerminalSocket::new();
/// socket.ensure_server_running()?;
/// socket.listen(
///     "abcd",
///     ConnectionCallbacks::new().on_received_input(|input| print!("{input}")),
/// )?;
/// println!("connect to ws://127.0.0.1:{}/terminal/abcd/", socket.port());
/// # Ok::<(), socket_core::error::socket::SocketError>(())
/// ```
pub struct TerminalSocket {
    config: SocketConfig,
    registry: ConnectionRegistry,
    allocator: Mutex<PortAllocator>,
    server: Mutex<Option<ServerHandle>>,
}

impl TerminalSocket {
    /// Create a stopped socket with default configuration.
    pub fn new() -> Self {
        Self::with_config(SocketConfig::default())
    }

    pub fn with_config(config: SocketConfig) -> Self {
        Self {
            allocator: Mutex::new(PortAllocator::from_config(&config)),
            config,
            registry: ConnectionRegistry::new(),
            server: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Start the server loop if it is not already running.
    ///
    /// # Errors
    ///
    /// - [`SocketError::PortExhausted`] / [`SocketError::BindFailed`] from port allocation
    /// - [`SocketError::Io`] if the loop runtime or thread cannot be started
    pub fn ensure_server_running(&self) -> Result<(), SocketError> {
        let mut server = self.lock_server();
        if server.is_some() {
            return Ok(());
        }

        let bind_ip = self
            .config
            .bind_ip()
            .map_err(|e| SocketError::BindFailed {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let (port, listener) = self
            .lock_allocator()
            .acquire(|port| StdTcpListener::bind(SocketAddr::new(bind_ip, port)))?;

        let handle = server::spawn(listener, self.registry.clone(), self.config.clone())?;
        info!("Terminal socket server running on {bind_ip}:{port}");

        *server = Some(handle);
        Ok(())
    }

    /// Register `callbacks` for `handle`.
    ///
    /// Registering a handle again replaces its callbacks; a connection already
    /// bound to it stays bound.
    ///
    /// # Errors
    ///
    /// - [`SocketError::NotConnected`] if the server is not running
    /// - [`SocketError::UnknownHandle`] if `handle` is empty (no path can carry it)
    pub fn listen(&self, handle: &str, callbacks: ConnectionCallbacks) -> Result<(), SocketError> {
        let server = self.lock_server();
        if server.is_none() {
            return Err(SocketError::not_connected(format!(
                "Cannot listen for '{handle}': terminal socket server is not running"
            )));
        }

        if handle.is_empty() {
            return Err(SocketError::unknown_handle(handle));
        }

        self.registry.register(handle, callbacks);
        info!("Listening for terminal '{handle}'");
        Ok(())
    }

    /// Unregister `handle`.
    ///
    /// A connection still bound to it is left to close on its own; its later
    /// events are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::UnknownHandle`] if `handle` is not registered.
    pub fn stop(&self, handle: &str) -> Result<(), SocketError> {
        let record = self
            .registry
            .unregister(handle)
            .ok_or_else(|| SocketError::unknown_handle(handle))?;

        let state = if record.live_connection.is_some() {
            "connected"
        } else {
            "idle"
        };
        info!("Stopped listening for terminal '{handle}' ({state})");
        Ok(())
    }

    /// Unregister every handle.
    pub fn stop_all(&self) -> Result<(), SocketError> {
        let count = self.registry.count();
        self.registry.clear();
        info!("Stopped listening for all terminals ({count})");
        Ok(())
    }

    /// Send `message` as a text frame to the connection bound to `handle`.
    ///
    /// # Errors
    ///
    /// - [`SocketError::NotConnected`] if `handle` is unregistered or its connection is gone
    /// - [`SocketError::SendFailed`] if the transport rejects the frame
    pub fn send_text(&self, handle: &str, message: &str) -> Result<(), SocketError> {
        let record = self.registry.get(handle);
        if !record.is_registered() {
            return Err(SocketError::not_connected(format!(
                "No terminal registered for '{handle}'"
            )));
        }

        let live = record
            .live_connection
            .filter(|live| live.is_open())
            .ok_or_else(|| {
                SocketError::not_connected(format!("Terminal '{handle}' has no open connection"))
            })?;

        live.send_text(message)
    }

    /// Bound port, or 0 when the server is not running.
    pub fn port(&self) -> u16 {
        self.lock_server().as_ref().map_or(0, ServerHandle::port)
    }

    /// Bound port if `handle` is registered, otherwise 0.
    pub fn port_for(&self, handle: &str) -> u16 {
        if self.registry.contains(handle) {
            self.port()
        } else {
            0
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_server().as_ref().map(ServerHandle::local_addr)
    }

    /// Number of registered handles.
    pub fn connection_count(&self) -> usize {
        self.registry.count()
    }

    pub fn is_running(&self) -> bool {
        self.lock_server().is_some()
    }

    /// Stop the server loop, dropping every registration.
    ///
    /// Blocks until the loop thread exits. Does nothing when already stopped.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Io`] when called from the loop thread itself
    /// (e.g. inside a callback), or if the loop thread panicked.
    pub fn stop_server(&self) -> Result<(), SocketError> {
        let handle = {
            let mut server = self.lock_server();
            if server.as_ref().is_some_and(ServerHandle::is_loop_thread) {
                return Err(SocketError::Io {
                    message: "stop_server called from the terminal socket loop thread".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            server.take()
        };

        let Some(handle) = handle else {
            return Ok(());
        };

        self.registry.clear();
        handle.shutdown()
    }

    fn lock_server(&self) -> MutexGuard<'_, Option<ServerHandle>> {
        self.server.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_allocator(&self) -> MutexGuard<'_, PortAllocator> {
        self.allocator.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TerminalSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalSocket {
    fn drop(&mut self) {
        // The last reference can be released inside a callback; the loop
        // thread cannot join itself, so it is only signalled.
        let server = self.server.get_mut().unwrap_or_else(|e| e.into_inner());
        if server.as_ref().is_some_and(ServerHandle::is_loop_thread) {
            if let Some(handle) = server.take() {
                self.registry.clear();
                handle.signal_shutdown();
            }
            return;
        }

        if let Err(e) = self.stop_server() {
            error!("Failed to stop terminal socket server on drop: {e}");
        }
    }
}
