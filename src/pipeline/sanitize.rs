//! Helpers for normalizing client-supplied file names.

use std::path::Path;

/// Reduce a client-supplied name to its final path component.
///
/// Returns `None` for names that are empty, dot-only, or contain control characters.
pub fn file_name_component(raw: &str) -> Option<String> {
    let candidate = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if candidate.is_empty()
        || candidate == "."
        || candidate == ".."
        || candidate.chars().any(char::is_control)
    {
        return None;
    }
    Some(candidate.to_string())
}

/// Accept a name only if it already is a bare file name.
pub fn exact_file_name(raw: &str) -> Option<String> {
    file_name_component(raw).filter(|name| name == raw)
}

/// File name without its final extension.
pub fn base_name(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}
