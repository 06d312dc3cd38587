// Unit tests for terminal handle extraction.

use crate::socket::path::extract_handle;

/// **VALUE**: Verifies the handle is the last segment before the trailing slash.
///
/// **WHY THIS MATTERS**: Clients connect to `ws://host:port/terminal/<handle>/`. The handle
/// is the only routing key, so extracting the wrong segment sends input to the wrong terminal.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one split that returns `terminal` or an
/// empty string instead of the handle.
#[test]
fn given_terminal_path_when_extract_handle_then_returns_last_segment() {
    assert_eq!(extract_handle("/terminal/abcd/"), Some("abcd"));
    assert_eq!(extract_handle("/abcd/"), Some("abcd"));
    assert_eq!(extract_handle("/a/b/c/session-42/"), Some("session-42"));
}

/// **VALUE**: Verifies paths without a trailing slash carry no handle.
///
/// **WHY THIS MATTERS**: Without the trailing slash there is no "segment before the last
/// slash" to route by; such connections must stay unbound rather than guess.
///
/// **BUG THIS CATCHES**: Would catch a lenient parser that treats `/terminal/abcd` as
/// handle `abcd` or `terminal`.
#[test]
fn given_path_without_trailing_slash_when_extract_handle_then_returns_none() {
    assert_eq!(extract_handle("/terminal/abcd"), None);
    assert_eq!(extract_handle("abcd"), None);
    assert_eq!(extract_handle(""), None);
}

/// **VALUE**: Verifies an empty last segment yields no handle.
///
/// **WHY THIS MATTERS**: An empty handle cannot be registered, so a path like `/` or
/// `/terminal//` must never route anywhere.
///
/// **BUG THIS CATCHES**: Would catch returning `Some("")`, which could match a record
/// stored under an empty key.
#[test]
fn given_empty_last_segment_when_extract_handle_then_returns_none() {
    assert_eq!(extract_handle("/"), None);
    assert_eq!(extract_handle("/terminal//"), None);
}

/// **VALUE**: Verifies query strings and fragments are ignored.
///
/// **BUG THIS CATCHES**: Would catch `?token=x` being folded into the handle, or the
/// query hiding the trailing slash.
#[test]
fn given_path_with_query_when_extract_handle_then_ignores_query() {
    assert_eq!(extract_handle("/terminal/abcd/?cols=80&rows=24"), Some("abcd"));
    assert_eq!(extract_handle("/terminal/abcd/#top"), Some("abcd"));
    assert_eq!(extract_handle("/terminal/abcd?x=/"), None);
}
