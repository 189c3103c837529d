//! Icon derivation for the extensions UI
//!
//! Icon resolution never fails outward: any problem (no icons block, a
//! missing file, a read error) degrades to an empty string so a broken
//! icon can't block listing the extension.

use crate::models::Manifest;
use crate::utils::resolve_resource;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Derive a data URI for the largest icon the manifest declares.
pub fn derive_icon(manifest: &Manifest, root: &Path) -> String {
    let icons = match &manifest.icons {
        Some(icons) if !icons.is_empty() => icons,
        _ => return String::new(),
    };

    // Largest declared size wins; non-numeric keys are ignored
    let largest = icons
        .iter()
        .filter_map(|(size, path)| size.parse::<u32>().ok().map(|s| (s, path)))
        .max_by_key(|(size, _)| *size);

    let (_, declared) = match largest {
        Some(entry) => entry,
        None => return String::new(),
    };

    let path = resolve_resource(root, declared);
    match fs::read(&path) {
        Ok(bytes) => format!(
            "data:{};base64,{}",
            mime_for(declared),
            STANDARD.encode(bytes)
        ),
        Err(e) => {
            debug!(icon = declared.as_str(), error = %e, "icon unreadable, using empty");
            String::new()
        }
    }
}

fn mime_for(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".svg") {
        "image/svg+xml"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "image/png"
    }
}
