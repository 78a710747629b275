/// Shared string helpers used across the pipeline and the Discord adapter.

/// Find the nearest char boundary at or before the given byte index.
/// Returns `s.len()` if `index >= s.len()`.
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Truncate a string to `max_len` bytes, cutting at a safe UTF-8 char and line boundary.
/// If the string is shorter than `max_len`, returns the original string unchanged.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let safe_end = floor_char_boundary(s, max_len);
    let truncated = &s[..safe_end];
    if let Some(pos) = truncated.rfind('\n') {
        truncated[..pos].to_string()
    } else {
        truncated.to_string()
    }
}

/// Drop the first `n` characters (not bytes). Returns "" when `s` is shorter.
pub fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}

/// The first `n` characters of `s` (or all of it when shorter).
pub fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Split into lines keeping each line's `\n` terminator.
pub fn lines_with_ends(s: &str) -> impl Iterator<Item = &str> {
    s.split_inclusive('\n')
}
