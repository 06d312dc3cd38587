//! HTTP request-head handling in front of the WebSocket protocol.
//!
//! The loop reads the request head itself so it can tell a WebSocket upgrade
//! apart from a plain request before committing the connection to either. Plain
//! requests get the diagnostic page; upgrades get a `101` and are handed to
//! `tokio-tungstenite` as an already-upgraded stream.

use crate::error::socket::SocketError;

use common::ErrorLocation;

use std::panic::Location;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::http::StatusCode;

const READ_CHUNK: usize = 1024;

const HEADER_UPGRADE: &str = "Upgrade";
const HEADER_CONNECTION: &str = "Connection";
const HEADER_WS_KEY: &str = "Sec-WebSocket-Key";
const HEADER_WS_VERSION: &str = "Sec-WebSocket-Version";
const WEBSOCKET_TOKEN: &str = "websocket";
const UPGRADE_TOKEN: &str = "upgrade";
const WEBSOCKET_VERSION: &str = "13";

/// Body served to every non-upgrade request.
pub const DIAGNOSTIC_BODY: &str =
    "<html><body><pre>\nInteresting diagnostics here.</pre></body></html>\n";

/// What an accepted connection asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestKind {
    /// A valid WebSocket upgrade.
    Upgrade { path: String, key: String },
    /// Anything else; answered with the diagnostic page.
    Plain { method: String, path: String },
}

/// A parsed request head plus any bytes read past its end.
#[derive(Debug)]
pub(crate) struct RequestHead {
    pub kind: RequestKind,
    pub trailing: Vec<u8>,
}

/// Read from `stream` until a full HTTP request head has arrived.
///
/// Returns `Ok(None)` if the peer closes before sending anything.
///
/// # Errors
///
/// Returns [`SocketError::Handshake`] if the head is malformed, larger than
/// `max_bytes`, or cut off by EOF, and [`SocketError::Io`] on read failure.
pub(crate) async fn read_request_head<S>(
    stream: &mut S,
    max_bytes: usize,
) -> Result<Option<RequestHead>, SocketError>
where
    S: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(handshake_error(format!(
                "Peer closed after {} bytes of request head",
                buf.len()
            )));
        }
        buf.extend_from_slice(&chunk[..read]);

        if let Some(head) = parse_request_head(&buf)? {
            return Ok(Some(head));
        }

        if buf.len() >= max_bytes {
            return Err(handshake_error(format!(
                "Request head exceeds {max_bytes} bytes"
            )));
        }
    }
}

/// Parse `buf` as a request head; `Ok(None)` means more bytes are needed.
pub(crate) fn parse_request_head(buf: &[u8]) -> Result<Option<RequestHead>, SocketError> {
    // Every header ends in a newline, so this many slots can never run out;
    // `max_request_head_bytes` is the only limit on header count.
    let header_slots = buf.iter().filter(|&&b| b == b'\n').count() + 1;
    let mut headers = vec![httparse::EMPTY_HEADER; header_slots];
    let mut request = httparse::Request::new(&mut headers);

    let consumed = match request.parse(buf) {
        Ok(httparse::Status::Complete(consumed)) => consumed,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(handshake_error(format!("Malformed request head: {e}"))),
    };

    Ok(Some(RequestHead {
        kind: classify(&request),
        trailing: buf[consumed..].to_vec(),
    }))
}

fn classify(request: &httparse::Request<'_, '_>) -> RequestKind {
    let method = request.method.unwrap_or_default().to_owned();
    let path = request.path.unwrap_or("/").to_owned();

    let upgrade =
        header(request, HEADER_UPGRADE).is_some_and(|v| has_token(v, WEBSOCKET_TOKEN));
    let connection =
        header(request, HEADER_CONNECTION).is_some_and(|v| has_token(v, UPGRADE_TOKEN));
    let version =
        header(request, HEADER_WS_VERSION).is_some_and(|v| v.trim() == WEBSOCKET_VERSION);
    let key = header(request, HEADER_WS_KEY).map(str::trim).filter(|k| !k.is_empty());

    match key {
        Some(key) if method == "GET" && upgrade && connection && version => RequestKind::Upgrade {
            path,
            key: key.to_owned(),
        },
        _ => RequestKind::Plain { method, path },
    }
}

fn header<'a>(request: &httparse::Request<'_, 'a>, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .and_then(|h| std::str::from_utf8(h.value).ok())
}

fn has_token(value: &str, token: &str) -> bool {
    value
        .split(',')
        .any(|part| part.trim().eq_ignore_ascii_case(token))
}

fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

/// Full `200 OK` response carrying [`DIAGNOSTIC_BODY`].
pub(crate) fn diagnostic_response() -> String {
    format!(
        "{}Content-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line(StatusCode::OK),
        DIAGNOSTIC_BODY.len(),
        DIAGNOSTIC_BODY
    )
}

/// `101 Switching Protocols` response accepting the client's `Sec-WebSocket-Key`.
pub(crate) fn switching_protocols_response(key: &str) -> String {
    format!(
        "{}Upgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {}\r\n\r\n",
        status_line(StatusCode::SWITCHING_PROTOCOLS),
        derive_accept_key(key.as_bytes())
    )
}

#[track_caller]
fn handshake_error(message: String) -> SocketError {
    SocketError::Handshake {
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}
