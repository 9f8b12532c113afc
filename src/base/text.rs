/// Normalize a title or target name into its lookup key.
///
/// ASCII letters are lowercased, digits kept, and every run of other
/// characters collapses to a single `-`. Leading and trailing dashes are
/// dropped, so `"Getting Started!"` becomes `"getting-started"`.
pub fn canonical_title(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    result
}

/// Split a `::` separated path into segments, dropping empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split("::").filter(|s| !s.is_empty()).collect()
}

pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join("::")
}
