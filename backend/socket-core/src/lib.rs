pub mod config;
pub mod error;
pub mod socket;

#[cfg(test)]
mod tests;

/// Host the listener binds to unless configured otherwise.
pub const TERMINAL_SOCKET_HOSTNAME: &str = "127.0.0.1";
