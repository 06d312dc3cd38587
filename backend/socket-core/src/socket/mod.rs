//! WebSocket multiplexer for terminal sessions.
//!
//! One listener serves many terminals. Each terminal registers a handle, and a
//! client reaches it by connecting to a URL whose last path segment is that
//! handle:
//!
//! ```text
//!                ws://127.0.0.1:<port>/terminal/<handle>/
//!                                  │
//!                         ┌────────▼────────┐
//!   caller threads ──────▶│ TerminalSocket  │  listen / stop / send_text
//!                         └────────┬────────┘
//!                                  │ ConnectionRegistry (Arc<Mutex<..>>)
//!                         ┌────────▼────────┐
//!                         │   loop thread   │  accept, upgrade, frames,
//!                         │ (current-thread │  callbacks
//!                         │  tokio runtime) │
//!                         └─────────────────┘
//! ```

pub mod callbacks;
pub mod path;
pub mod port_allocator;
pub mod registry;
pub mod terminal_socket;

pub(crate) mod http;
pub(crate) mod server;
pub(crate) mod server_handle;

pub use callbacks::{ConnectionCallbacks, EventCallback, InputCallback};
pub use http::DIAGNOSTIC_BODY;
pub use path::extract_handle;
pub use port_allocator::PortAllocator;
pub use registry::{ConnectionRecord, ConnectionRegistry, LiveConnection};
pub use terminal_socket::TerminalSocket;
