//! Command-line arguments for the terminal host.

use crate::error::HostError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;

use clap::Parser;

/// Directory under the platform config dir used when `--config-dir` is absent.
pub const APP_DIR_NAME: &str = "terminal-host";

#[derive(Debug, Parser)]
#[command(
    name = "terminal-host",
    version,
    about = "Serve terminal sessions over one WebSocket listener"
)]
pub struct Cli {
    /// Directory holding terminal-socket.json
    #[arg(long, env = "TERMINAL_HOST_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Directory for terminal-host.log (defaults to the config directory)
    #[arg(long, env = "TERMINAL_HOST_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Terminal handle to listen for; repeat for several terminals
    #[arg(long = "handle", value_name = "HANDLE")]
    pub handles: Vec<String>,

    /// Send every received input back to the same terminal
    #[arg(long)]
    pub echo: bool,
}

impl Cli {
    /// Resolved config directory.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Host`] if no directory was given and the platform
    /// has no config directory.
    #[track_caller]
    pub fn config_dir(&self) -> Result<PathBuf, HostError> {
        if let Some(dir) = &self.config_dir {
            return Ok(dir.clone());
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| HostError::Host {
                message: "No platform config directory; pass --config-dir".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    pub fn log_dir(&self) -> Result<PathBuf, HostError> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => self.config_dir(),
        }
    }
}
