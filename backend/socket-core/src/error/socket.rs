use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SocketError {
    /// Every candidate port in the retry budget was already in use.
    #[error("Port Exhausted Error: {message} {location}")]
    PortExhausted {
        message: String,
        location: ErrorLocation,
    },

    /// Bind failed for a reason other than the address being in use.
    #[error("Bind Error: {message} {location}")]
    BindFailed {
        message: String,
        location: ErrorLocation,
    },

    /// Server is not running, or the handle has no live connection.
    #[error("Not Connected Error: {message} {location}")]
    NotConnected {
        message: String,
        location: ErrorLocation,
    },

    /// Handle is not registered (or its record belongs to another handle).
    #[error("Unknown Handle Error: {message} {location}")]
    UnknownHandle {
        message: String,
        location: ErrorLocation,
    },

    /// Transport rejected an outbound frame.
    #[error("Send Error: {message} {location}")]
    SendFailed {
        message: String,
        location: ErrorLocation,
    },

    /// Malformed or oversized request head on an accepted connection.
    #[error("Handshake Error: {message} {location}")]
    Handshake {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },
}

impl SocketError {
    #[track_caller]
    pub(crate) fn not_connected(message: impl Into<String>) -> Self {
        SocketError::NotConnected {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn unknown_handle(handle: &str) -> Self {
        SocketError::UnknownHandle {
            message: format!("No terminal registered for handle '{handle}'"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IoError> for SocketError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        SocketError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
