// Unit tests for request-head parsing and the raw HTTP responses.

use crate::error::socket::SocketError;
use crate::socket::http::{
    DIAGNOSTIC_BODY, RequestKind, diagnostic_response, parse_request_head, read_request_head,
    switching_protocols_response,
};

const UPGRADE_REQUEST: &str = "GET /terminal/abcd/ HTTP/1.1\r\n\
Host: 127.0.0.1:3000\r\n\
Upgrade: websocket\r\n\
Connection: keep-alive, Upgrade\r\n\
Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
Sec-WebSocket-Version: 13\r\n\
\r\n";

/// **VALUE**: Verifies a standard upgrade request is classified as an upgrade with its
/// path and key intact.
///
/// **WHY THIS MATTERS**: Browsers send `Connection: keep-alive, Upgrade`. Matching the
/// header exactly would misroute real clients to the diagnostic page.
///
/// **BUG THIS CATCHES**: Would catch exact-match header checks or a lost request path.
#[test]
fn given_upgrade_request_when_parsed_then_classified_as_upgrade() {
    let head = parse_request_head(UPGRADE_REQUEST.as_bytes())
        .unwrap()
        .expect("complete head");

    assert_eq!(
        head.kind,
        RequestKind::Upgrade {
            path: "/terminal/abcd/".to_string(),
            key: "dGhlIHNhbXBsZSBub25jZQ==".to_string(),
        }
    );
    assert!(head.trailing.is_empty());
}

/// **VALUE**: Verifies a plain GET is classified as a diagnostic request.
#[test]
fn given_plain_get_when_parsed_then_classified_as_plain() {
    let request = b"GET /status HTTP/1.1\r\nHost: localhost\r\n\r\n";

    let head = parse_request_head(request).unwrap().expect("complete head");

    assert_eq!(
        head.kind,
        RequestKind::Plain {
            method: "GET".to_string(),
            path: "/status".to_string(),
        }
    );
}

/// **VALUE**: Verifies upgrade headers on a non-GET request do not trigger an upgrade.
///
/// **BUG THIS CATCHES**: Would catch a classifier that ignores the method.
#[test]
fn given_post_with_upgrade_headers_when_parsed_then_classified_as_plain() {
    let request = UPGRADE_REQUEST.replacen("GET", "POST", 1);

    let head = parse_request_head(request.as_bytes()).unwrap().unwrap();

    assert!(matches!(head.kind, RequestKind::Plain { ref method, .. } if method == "POST"));
}

/// **VALUE**: Verifies an unsupported WebSocket version is not upgraded.
#[test]
fn given_wrong_websocket_version_when_parsed_then_classified_as_plain() {
    let request = UPGRADE_REQUEST.replace("Sec-WebSocket-Version: 13", "Sec-WebSocket-Version: 8");

    let head = parse_request_head(request.as_bytes()).unwrap().unwrap();

    assert!(matches!(head.kind, RequestKind::Plain { .. }));
}

/// **VALUE**: Verifies a partial head asks for more bytes instead of failing.
///
/// **WHY THIS MATTERS**: TCP delivers the head in arbitrary chunks. Treating a partial head
/// as malformed would drop clients on slow links.
#[test]
fn given_partial_head_when_parsed_then_returns_none() {
    let partial = &UPGRADE_REQUEST.as_bytes()[..40];

    assert!(parse_request_head(partial).unwrap().is_none());
}

/// **VALUE**: Verifies garbage input is a handshake error.
#[test]
fn given_malformed_head_when_parsed_then_returns_handshake_error() {
    let result = parse_request_head(b"\x00\x01 not http\r\n\r\n");

    assert!(matches!(result, Err(SocketError::Handshake { .. })));
}

/// **VALUE**: Verifies bytes after the head are preserved for the WebSocket layer.
///
/// **WHY THIS MATTERS**: A client may pipeline its first frame right after the handshake.
/// Dropping those bytes would lose the first keystrokes of the session.
#[test]
fn given_bytes_after_head_when_parsed_then_kept_as_trailing() {
    let mut request = UPGRADE_REQUEST.as_bytes().to_vec();
    request.extend_from_slice(&[0x81, 0x82]);

    let head = parse_request_head(&request).unwrap().unwrap();

    assert_eq!(head.trailing, vec![0x81, 0x82]);
}

/// **VALUE**: Verifies reading a head from a stream, including EOF before any byte.
#[tokio::test]
async fn given_stream_when_read_request_head_then_handles_complete_and_empty_input() {
    let mut complete = UPGRADE_REQUEST.as_bytes();
    let head = read_request_head(&mut complete, 8192).await.unwrap();
    assert!(matches!(
        head.map(|h| h.kind),
        Some(RequestKind::Upgrade { .. })
    ));

    let mut empty: &[u8] = &[];
    assert!(read_request_head(&mut empty, 8192).await.unwrap().is_none());
}

/// **VALUE**: Verifies truncated and oversized heads are rejected.
///
/// **BUG THIS CATCHES**: Would catch a reader that buffers without limit or hangs on EOF
/// mid-head.
#[tokio::test]
async fn given_truncated_or_oversized_head_when_read_then_returns_handshake_error() {
    let mut truncated = &UPGRADE_REQUEST.as_bytes()[..30];
    assert!(matches!(
        read_request_head(&mut truncated, 8192).await,
        Err(SocketError::Handshake { .. })
    ));

    let oversized = format!("GET / HTTP/1.1\r\nX-Filler: {}\r\n", "a".repeat(4096));
    let mut oversized = oversized.as_bytes();
    assert!(matches!(
        read_request_head(&mut oversized, 1024).await,
        Err(SocketError::Handshake { .. })
    ));
}

/// **VALUE**: Verifies the diagnostic page is a complete `200 OK` response with the fixed body.
#[test]
fn given_diagnostic_response_when_rendered_then_ok_with_body_and_length() {
    let response = diagnostic_response();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains(&format!("Content-Length: {}\r\n", DIAGNOSTIC_BODY.len())));
    assert!(response.contains("Content-Type: text/html"));
    assert!(response.ends_with(DIAGNOSTIC_BODY));
}

/// **VALUE**: Verifies the accept key matches the RFC 6455 sample handshake.
///
/// **BUG THIS CATCHES**: Would catch hashing the wrong bytes; every client would then
/// reject the handshake.
#[test]
fn given_sample_key_when_switching_protocols_rendered_then_accept_matches_rfc() {
    let response = switching_protocols_response("dGhlIHNhbXBsZSBub25jZQ==");

    assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
    assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
    assert!(response.ends_with("\r\n\r\n"));
}

/// **VALUE**: Verifies requests with many headers are still classified.
///
/// **WHY THIS MATTERS**: Browsers behind proxies can send long header lists. A fixed header
/// table would reject them as malformed and drop the connection without any response.
///
/// **BUG THIS CATCHES**: Would catch a fixed-size header buffer failing with
/// `TooManyHeaders` well below the request-head byte limit.
#[test]
fn given_many_headers_when_parsed_then_still_classified() {
    let filler: String = (0..200).map(|i| format!("X-Filler-{i}: {i}\r\n")).collect();
    let plain = format!("GET /status HTTP/1.1\r\nHost: localhost\r\n{filler}\r\n");
    let upgrade = UPGRADE_REQUEST.replacen("\r\n\r\n", &format!("\r\n{filler}\r\n"), 1);

    let plain_head = parse_request_head(plain.as_bytes()).unwrap().unwrap();
    let upgrade_head = parse_request_head(upgrade.as_bytes()).unwrap().unwrap();

    assert!(matches!(plain_head.kind, RequestKind::Plain { .. }));
    assert!(matches!(upgrade_head.kind, RequestKind::Upgrade { .. }));
}
