//! Handle to a running terminal socket loop.

use crate::error::socket::SocketError;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use tokio::sync::oneshot;

/// Owns the loop thread and its shutdown signal.
///
/// Returned by [`server::spawn`](crate::socket::server::spawn). Dropping it
/// without calling [`Self::shutdown`] drops the signal sender, which also ends
/// the loop, but leaves the thread detached.
pub(crate) struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    pub(crate) fn new(
        local_addr: SocketAddr,
        shutdown_tx: oneshot::Sender<()>,
        thread: JoinHandle<()>,
    ) -> Self {
        Self {
            local_addr,
            shutdown_tx,
            thread,
        }
    }

    pub(crate) fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// True when called from inside the loop thread (e.g. from a callback).
    pub(crate) fn is_loop_thread(&self) -> bool {
        self.thread.thread().id() == thread::current().id()
    }

    /// Signal the loop to stop without waiting for it.
    ///
    /// For use on the loop thread itself, which cannot join itself. The loop
    /// exits once the task currently running on it yields.
    pub(crate) fn signal_shutdown(self) {
        let addr = self.local_addr;
        if self.shutdown_tx.send(()).is_err() {
            warn!("Terminal socket loop on {addr} had already exited");
        }
        debug!("Terminal socket loop on {addr} signalled from its own thread");
    }

    /// Signal the loop to stop and wait for its thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Io`] if the loop thread panicked.
    #[track_caller]
    pub(crate) fn shutdown(self) -> Result<(), SocketError> {
        let addr = self.local_addr;

        if self.shutdown_tx.send(()).is_err() {
            warn!("Terminal socket loop on {addr} had already exited");
        }

        self.thread.join().map_err(|_| SocketError::Io {
            message: format!("Terminal socket loop on {addr} panicked"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("Terminal socket loop on {addr} stopped");
        Ok(())
    }
}
