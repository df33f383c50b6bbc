/// Return at most the first `length` characters of `text`.
///
/// Never splits a character and never panics when `length` exceeds the
/// text size.
pub fn preview_text(text: &str, length: usize) -> &str {
    match text.char_indices().nth(length) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
