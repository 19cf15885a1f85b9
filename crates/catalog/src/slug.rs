//! URL slugs derived from display names.

/// Maximum slug length (in characters).
pub const MAX_SLUG_LEN: usize = 120;

/// Derive a URL slug from a display name.
///
/// Lowercases alphanumerics in any script, collapses every other run of
/// characters into a single `-`, and truncates to [`MAX_SLUG_LEN`] characters
/// without a trailing `-`.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('-');
            }
            pending_separator = false;
            out.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if let Some((cut, _)) = out.char_indices().nth(MAX_SLUG_LEN) {
        out.truncate(cut);
        while out.ends_with('-') {
            out.pop();
        }
    }

    out
}
