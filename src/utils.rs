/// Marker appended to any value cut by [`truncate_string`].
pub const ELLIPSIS: &str = "...";

/// Keep the first `max_chars` characters of `s`, appending [`ELLIPSIS`] when
/// anything was cut. Counts Unicode scalar values, so a multi-byte character
/// is never split.
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}{}", &s[..byte_idx], ELLIPSIS),
    }
}

/// True when `s` is absent or the empty string. Whitespace counts as content.
pub fn is_blank(s: Option<&str>) -> bool {
    s.is_none_or(str::is_empty)
}
