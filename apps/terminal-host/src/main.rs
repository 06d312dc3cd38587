use terminal_host::cli::Cli;
use terminal_host::error::HostError;
use terminal_host::logger::initialize as LoggerInitialize;
use terminal_host::terminal::terminal_callbacks;

use socket_core::config::SocketConfig;
use socket_core::socket::TerminalSocket;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::sync::Arc;

use clap::Parser;
use log::{info, warn};
use tokio::signal::ctrl_c;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), HostError> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir()?;
    let log_dir = cli.log_dir()?;

    create_dir_all(&log_dir).map_err(|e| HostError::Host {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("Terminal host starting");
    info!("Config directory: {}", config_dir.display());
    info!("Log directory: {}", log_dir.display());

    let config = SocketConfig::load(&config_dir)?;
    let socket = Arc::new(TerminalSocket::with_config(config));
    socket.ensure_server_running()?;

    let port = socket.port();
    if cli.handles.is_empty() {
        warn!("No --handle given; only the diagnostic page is served on port {port}");
    }
    for handle in &cli.handles {
        socket.listen(handle, terminal_callbacks(&socket, handle, cli.echo))?;
        info!(
            "Terminal '{handle}' at ws://{}:{port}/terminal/{handle}/",
            socket.config().bind_host
        );
    }

    ctrl_c().await.map_err(|e| HostError::Host {
        message: format!("Failed to listen for Ctrl-C: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Ctrl-C received, shutting down");
    socket.stop_server()?;
    Ok(())
}
