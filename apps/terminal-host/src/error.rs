use common::ErrorLocation;

use socket_core::error::config::ConfigError;
use socket_core::error::socket::SocketError;

use std::panic::Location;

use thiserror::Error;

/// Errors that end the host process.
///
/// Library errors are flattened into a message at the point they cross into
/// the host, keeping the host's own location alongside the library's.
#[derive(Debug, Error)]
pub enum HostError {
    /// Error from this app (directories, logger, signals)
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Error from the terminal socket
    #[error("Socket Error: {message} {location}")]
    Socket {
        message: String,
        location: ErrorLocation,
    },

    /// Socket config could not be loaded
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },
}

impl From<SocketError> for HostError {
    #[track_caller]
    fn from(error: SocketError) -> Self {
        HostError::Socket {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for HostError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        HostError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
