//! Handle-to-connection registry shared by the server loop and callers.
//!
//! Every operation takes the same mutex for its whole duration, so neither the
//! loop thread nor a caller thread can observe a half-updated record. Absent
//! handles are not errors: lookups return an empty record, because the loop
//! probes for handles that may belong to nobody on every event.

use crate::error::socket::SocketError;
use crate::socket::callbacks::ConnectionCallbacks;

use common::ErrorLocation;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

/// Transport-side reference to one open WebSocket connection.
///
/// Frames pushed here are drained by the connection's writer task on the loop
/// thread. Once that task ends the channel closes and [`Self::is_open`] turns
/// false.
#[derive(Debug, Clone)]
pub struct LiveConnection {
    id: Uuid,
    peer: SocketAddr,
    outbound: UnboundedSender<Message>,
}

impl LiveConnection {
    pub(crate) fn new(peer: SocketAddr, outbound: UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            outbound,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Queue a text frame for this connection.
    #[track_caller]
    pub(crate) fn send_text(&self, message: &str) -> Result<(), SocketError> {
        self.outbound
            .send(Message::text(message.to_owned()))
            .map_err(|e| SocketError::SendFailed {
                message: format!("Connection {} rejected frame: {e}", self.id),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Registration state for one terminal handle.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRecord {
    /// Empty only for the placeholder returned for unregistered handles.
    pub handle: String,
    pub live_connection: Option<LiveConnection>,
    pub callbacks: ConnectionCallbacks,
}

impl ConnectionRecord {
    pub fn new(handle: impl Into<String>, callbacks: ConnectionCallbacks) -> Self {
        Self {
            handle: handle.into(),
            live_connection: None,
            callbacks,
        }
    }

    pub fn is_registered(&self) -> bool {
        !self.handle.is_empty()
    }

    /// True when connection `id` is the one currently attached.
    pub fn is_bound_to(&self, id: Uuid) -> bool {
        self.live_connection
            .as_ref()
            .is_some_and(|live| live.id() == id)
    }
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    records: Arc<Mutex<HashMap<String, ConnectionRecord>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `handle`, or an empty record if it is not registered.
    pub fn get(&self, handle: &str) -> ConnectionRecord {
        self.lock().get(handle).cloned().unwrap_or_default()
    }

    pub fn set(&self, handle: impl Into<String>, record: ConnectionRecord) {
        self.lock().insert(handle.into(), record);
    }

    /// Remove and return the record for `handle` (empty record if absent).
    pub fn remove(&self, handle: &str) -> ConnectionRecord {
        self.lock().remove(handle).unwrap_or_default()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.lock().contains_key(handle)
    }

    /// Register `callbacks` for `handle`, keeping any connection already bound.
    pub(crate) fn register(&self, handle: &str, callbacks: ConnectionCallbacks) {
        let mut records = self.lock();
        match records.get_mut(handle) {
            Some(record) => record.callbacks = callbacks,
            None => {
                records.insert(handle.to_owned(), ConnectionRecord::new(handle, callbacks));
            }
        }
    }

    /// Remove the record for `handle` if one is stored under a matching handle.
    pub(crate) fn unregister(&self, handle: &str) -> Option<ConnectionRecord> {
        let mut records = self.lock();
        match records.get(handle) {
            Some(record) if record.handle == handle => records.remove(handle),
            _ => None,
        }
    }

    /// Callbacks for `handle`, only while connection `id` is the one bound to it.
    pub(crate) fn callbacks_if_bound(
        &self,
        handle: &str,
        id: Uuid,
    ) -> Option<ConnectionCallbacks> {
        self.lock()
            .get(handle)
            .filter(|record| record.is_bound_to(id))
            .map(|record| record.callbacks.clone())
    }

    /// Attach `live` to a registered handle.
    ///
    /// Returns the handle's callbacks, or `None` (and attaches nothing) if the
    /// handle is not registered.
    pub(crate) fn bind_live(
        &self,
        handle: &str,
        live: LiveConnection,
    ) -> Option<ConnectionCallbacks> {
        let mut records = self.lock();
        let record = records.get_mut(handle)?;
        record.live_connection = Some(live);
        Some(record.callbacks.clone())
    }

    /// Detach connection `id` from `handle`.
    ///
    /// Returns the callbacks only if `id` was the bound connection. A newer
    /// connection bound to the same handle is left in place and `None` is
    /// returned, so the replaced connection's close goes unreported.
    pub(crate) fn unbind_live(&self, handle: &str, id: Uuid) -> Option<ConnectionCallbacks> {
        let mut records = self.lock();
        let record = records.get_mut(handle)?;
        if !record.is_bound_to(id) {
            return None;
        }
        record.live_connection = None;
        Some(record.callbacks.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ConnectionRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}
