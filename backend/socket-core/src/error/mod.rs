pub mod config;
pub mod socket;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Socket(#[from] socket::SocketError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
