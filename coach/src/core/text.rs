//! Character-bounded text helpers.

/// Truncate `text` to at most `max_chars` characters, appending `marker`
/// when anything was cut. Counts `char`s, not bytes.
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + marker.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(marker);
            out
        }
        None => text.to_string(),
    }
}

/// Replace line breaks with spaces and trim, for compact single-line storage.
pub fn flatten_lines(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}
