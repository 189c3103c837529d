//! Helper utility functions

use std::path::{Path, PathBuf};

/// Sanitize a downloaded package's filename stem into an install identifier
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Resolve a manifest-declared resource path against an extension root,
/// tolerating a leading separator or `./` prefix.
pub fn resolve_resource(root: &Path, declared: &str) -> PathBuf {
    let relative = declared
        .strip_prefix("./")
        .or_else(|| declared.strip_prefix('/'))
        .unwrap_or(declared);
    root.join(relative)
}
