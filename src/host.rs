//! Host extension-loading primitive
//!
//! The shell's native runtime owns true extension lifecycle; this crate
//! only wraps it. The primitive is an opaque, possibly-duplicating
//! enumeration source: the registry deduplicates what it reports.

use crate::models::Manifest;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// An extension as reported by the host primitive.
#[derive(Debug, Clone)]
pub struct HostExtension {
    pub id: String,
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub manifest: Manifest,
}

/// Capability implemented by the embedding shell.
pub trait ExtensionHost {
    /// Load a directory as an extension, returning its declared manifest
    /// and a stable identifier.
    fn load_extension(&mut self, path: &Path) -> Result<HostExtension>;

    /// Enumerate currently loaded extensions. May report duplicates.
    fn list_extensions(&self) -> Vec<HostExtension>;

    fn remove_extension(&mut self, id: &str) -> Result<()>;
}
