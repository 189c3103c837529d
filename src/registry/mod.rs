//! Extension registry
//!
//! A read-only projection over whatever the host primitive currently
//! reports, plus the removal and bulk-load entry points. The host may
//! report the same identifier from more than one internal list, so
//! enumeration deduplicates with first-seen-wins, preserving order.

pub mod icons;

use crate::error::PlatformError;
use crate::host::{ExtensionHost, HostExtension};
use crate::models::{ExtensionInfo, Manifest};
use crate::parser;
use crate::storage::StorageBridge;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of loading an unpacked extension through the directory chooser.
/// `None` input means the user dismissed the chooser.
#[derive(Debug)]
pub enum UnpackedLoad {
    Installed(ExtensionInfo),
    Cancelled,
    Failed(String),
}

/// Enumerate loaded extensions with display metadata derived per entry.
pub fn list_extensions(host: &dyn ExtensionHost, scheme: &str) -> Vec<ExtensionInfo> {
    let mut seen = HashSet::new();
    host.list_extensions()
        .into_iter()
        .filter(|ext| seen.insert(ext.id.clone()))
        .map(|ext| derive_info(ext, scheme))
        .collect()
}

/// Attach derived metadata to a host record.
pub fn derive_info(ext: HostExtension, scheme: &str) -> ExtensionInfo {
    let icon = icons::derive_icon(&ext.manifest, &ext.path);
    let popup_url = popup_url(&ext.manifest, &ext.id, scheme);
    let description = ext.manifest.description.clone().unwrap_or_default();

    ExtensionInfo {
        id: ext.id,
        name: ext.name,
        version: ext.version,
        path: ext.path,
        manifest: ext.manifest,
        description,
        icon,
        popup_url,
    }
}

/// Build the popup entry URL from the manifest's action block, when one
/// declares a default popup.
pub fn popup_url(manifest: &Manifest, id: &str, scheme: &str) -> Option<String> {
    let popup = manifest.action_block()?.default_popup.as_deref()?;
    let relative = popup
        .strip_prefix("./")
        .or_else(|| popup.strip_prefix('/'))
        .unwrap_or(popup);
    Some(format!("{}://{}/{}", scheme, id, relative))
}

/// Remove an extension from the host and clean up its durable storage.
/// Storage cleanup is best-effort and proceeds even when the host rejects
/// the removal; it is not rolled back.
pub fn remove_extension(
    host: &mut dyn ExtensionHost,
    storage: &mut StorageBridge,
    id: &str,
) -> Result<(), PlatformError> {
    let result = host
        .remove_extension(id)
        .map_err(|e| PlatformError::RemovalFailed(format!("{}: {}", id, e)));

    storage.delete_store(id);

    result
}

/// Load every extension directory under `root` at startup. A directory
/// without a parseable manifest is skipped with a diagnostic; a single
/// malformed extension must not block the rest.
pub fn load_installed(host: &mut dyn ExtensionHost, root: &Path) -> Vec<HostExtension> {
    if !root.is_dir() {
        warn!(root = %root.display(), "extensions root unreadable");
        return Vec::new();
    }

    let mut loaded = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let dir = entry.path();
        if let Err(e) = parser::read_manifest(dir) {
            warn!(dir = %dir.display(), error = %e, "skipping directory without usable manifest");
            continue;
        }
        match host.load_extension(dir) {
            Ok(ext) => {
                info!(id = ext.id.as_str(), "loaded installed extension");
                loaded.push(ext);
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "host rejected installed extension"),
        }
    }
    loaded
}

/// Load a user-chosen directory as an unpacked extension.
pub fn load_unpacked(
    host: &mut dyn ExtensionHost,
    dir: Option<PathBuf>,
    scheme: &str,
) -> UnpackedLoad {
    let dir = match dir {
        Some(dir) => dir,
        None => return UnpackedLoad::Cancelled,
    };

    if !dir.join(parser::MANIFEST_FILE).is_file() {
        return UnpackedLoad::Failed(PlatformError::ManifestMissing(dir).to_string());
    }
    if let Err(e) = parser::read_manifest(&dir) {
        return UnpackedLoad::Failed(e.to_string());
    }

    match host.load_extension(&dir) {
        Ok(ext) => UnpackedLoad::Installed(derive_info(ext, scheme)),
        Err(e) => UnpackedLoad::Failed(e.to_string()),
    }
}
