//! Route path normalization.

use percent_encoding::percent_decode_str;

/// Normalize a route or request path.
///
/// Repeated separators collapse, `.` and `..` are resolved lexically, the
/// trailing separator is dropped and the result always has exactly one
/// leading `/`.
pub fn clean_route(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    let mut cleaned = String::with_capacity(path.len() + 1);
    cleaned.push('/');
    cleaned.push_str(&stack.join("/"));
    cleaned
}

/// Segments of a path after cleaning, percent-decoded. The root has no segments.
pub fn segments(path: &str) -> Vec<String> {
    clean_route(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect()
}

/// Percent-decode one segment. Invalid UTF-8 is replaced, not rejected.
pub fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Decoded segments of a path remainder, for joining onto a directory.
/// `None` if any decoded segment could step outside it.
pub fn file_segments(rest: &str) -> Option<Vec<String>> {
    rest.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let decoded = decode_segment(s);
            let unsafe_segment = decoded == "."
                || decoded == ".."
                || decoded.contains(['/', '\\', '\0']);
            (!unsafe_segment).then_some(decoded)
        })
        .collect()
}

/// Whether `path` lies under `prefix` on a segment boundary.
/// Returns the remainder after the prefix, without its leading `/`.
pub fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix == "/" {
        return Some(path.trim_start_matches('/'));
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}
