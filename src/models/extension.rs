//! Extension representation and derived display metadata

use super::manifest::Manifest;
use std::path::PathBuf;

/// An extension as presented to the browser UI: the host's record plus
/// metadata derived from the manifest by the registry.
#[derive(Debug, Clone)]
pub struct ExtensionInfo {
    /// Opaque identifier, stable across loads.
    pub id: String,
    pub name: String,
    pub version: String,
    /// Filesystem root of the unpacked extension.
    pub path: PathBuf,
    pub manifest: Manifest,
    pub description: String,
    /// Icon as a data URI, or empty when derivation failed.
    pub icon: String,
    /// Fully-qualified popup entry URL, when the extension declares one.
    pub popup_url: Option<String>,
}
