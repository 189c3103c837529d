//! Manifest parsing
//!
//! Manifests in the wild carry comments and trailing commas, so parsing
//! goes through json5 rather than strict JSON. Parsing stops at "fits the
//! typed model": version acceptance is the host primitive's call.

use crate::models::Manifest;
use anyhow::{Context, Result};
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Parse raw manifest bytes.
pub fn parse_manifest(content: &[u8]) -> Result<Manifest> {
    let text = std::str::from_utf8(content).context("Invalid UTF-8 in manifest.json")?;
    json5::from_str(text).context("Failed to parse manifest.json")
}

/// Read and parse `manifest.json` from an extension's root directory.
pub fn read_manifest(extension_dir: &Path) -> Result<Manifest> {
    let path = extension_dir.join(MANIFEST_FILE);
    let content =
        std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_manifest(&content)
}
