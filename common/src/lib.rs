//! Shared building blocks for the terminal socket workspace.
//!
//! Everything here is dependency-light and used by both the `socket-core`
//! library and the `terminal-host` binary.

pub mod error;

pub use error::error_location::ErrorLocation;
