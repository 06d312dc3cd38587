//! Random listening-port selection with retry on bind conflicts.

use crate::config::{
    DEFAULT_MAX_PORT_RETRIES, DEFAULT_PORT_RANGE_END, DEFAULT_PORT_RANGE_START, SocketConfig,
};
use crate::error::socket::SocketError;

use common::ErrorLocation;

use std::io::{Error as IoError, ErrorKind};
use std::ops::Range;
use std::panic::Location;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks candidate ports at random from a range and hands each one to a bind
/// primitive until one succeeds.
///
/// The generator is owned by the allocator. Production allocators seed from
/// OS entropy once, at construction; tests inject a seeded generator through
/// [`PortAllocator::with_rng`].
pub struct PortAllocator<R = StdRng> {
    /// Candidate ports (end exclusive).
    range: Range<u16>,
    /// Attempts before reporting [`SocketError::PortExhausted`].
    max_retries: u32,
    rng: R,
}

impl PortAllocator<StdRng> {
    /// Create an allocator seeded from OS entropy.
    pub fn new(range: Range<u16>, max_retries: u32) -> Self {
        Self::with_rng(range, max_retries, StdRng::from_os_rng())
    }

    pub fn from_config(config: &SocketConfig) -> Self {
        Self::new(config.port_range(), config.max_port_retries)
    }
}

impl Default for PortAllocator<StdRng> {
    fn default() -> Self {
        Self::new(
            DEFAULT_PORT_RANGE_START..DEFAULT_PORT_RANGE_END,
            DEFAULT_MAX_PORT_RETRIES,
        )
    }
}

impl<R: Rng> PortAllocator<R> {
    pub fn with_rng(range: Range<u16>, max_retries: u32, rng: R) -> Self {
        Self {
            range,
            max_retries,
            rng,
        }
    }

    /// Draw the next candidate port.
    pub fn candidate(&mut self) -> u16 {
        self.rng.random_range(self.range.clone())
    }

    /// Try random candidates with `bind` until one succeeds.
    ///
    /// `AddrInUse` moves on to a fresh candidate; any other bind error is
    /// returned at once.
    ///
    /// # Errors
    ///
    /// - [`SocketError::BindFailed`] for a non-conflict bind error or an empty range
    /// - [`SocketError::PortExhausted`] when every attempt hit `AddrInUse`
    #[track_caller]
    pub fn acquire<T, F>(&mut self, mut bind: F) -> Result<(u16, T), SocketError>
    where
        F: FnMut(u16) -> Result<T, IoError>,
    {
        if self.range.is_empty() {
            return Err(SocketError::BindFailed {
                message: format!(
                    "Empty port range {}..{}",
                    self.range.start, self.range.end
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        for attempt in 1..=self.max_retries {
            let port = self.candidate();
            match bind(port) {
                Ok(bound) => {
                    info!("Bound port {port} after {attempt} attempt(s)");
                    return Ok((port, bound));
                }
                Err(e) if e.kind() == ErrorKind::AddrInUse => {
                    debug!("Port {port} in use (attempt {attempt}/{})", self.max_retries);
                }
                Err(e) => {
                    return Err(SocketError::BindFailed {
                        message: format!("Failed to bind port {port}: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }

        Err(SocketError::PortExhausted {
            message: format!(
                "Couldn't find an available port in {}..{} after {} attempts",
                self.range.start, self.range.end, self.max_retries
            ),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
