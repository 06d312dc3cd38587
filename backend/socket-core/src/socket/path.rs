//! Terminal handle extraction from request paths.

/// Return the terminal handle carried by a request path.
///
/// The path must end in `/`; the handle is the segment right before it, so
/// `/terminal/abcd/` yields `abcd`. Any query string or fragment is ignored.
/// Paths without a trailing `/`, or whose last segment is empty, carry no
/// handle.
pub fn extract_handle(path: &str) -> Option<&str> {
    let path = path.split(['?', '#']).next()?;
    let trimmed = path.strip_suffix('/')?;
    let segment = trimmed.rsplit('/').next()?;
    (!segment.is_empty()).then_some(segment)
}
