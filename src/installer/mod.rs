//! Packaged extension installation
//!
//! Downloads arrive as archives, sometimes wrapped in a proprietary
//! signature header. Installation locates the real archive payload,
//! extracts it into the extensions root and hands the directory to the
//! host load primitive. Extracted files stay on disk even when a later
//! step fails, for diagnostics; the downloaded artifact is only deleted
//! once everything succeeded.

pub mod extractor;

use crate::error::PlatformError;
use crate::host::{ExtensionHost, HostExtension};
use crate::utils::sanitize_name;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// What became of an observed download.
#[derive(Debug)]
pub enum DownloadDisposition {
    Installed(HostExtension),
    /// Not a package; left to default download handling.
    Ignored,
}

/// Install a downloaded package archive.
///
/// The target directory is named by `suggested_id`; on collision the
/// existing directory is overwritten in place.
pub fn install_from_archive(
    host: &mut dyn ExtensionHost,
    extensions_root: &Path,
    archive_path: &Path,
    suggested_id: &str,
) -> Result<HostExtension, PlatformError> {
    let bytes = fs::read(archive_path)
        .map_err(|e| PlatformError::ExtractionFailed(format!("cannot read package: {}", e)))?;

    let offset = find_payload(&bytes)?;
    if offset > 0 {
        debug!(offset, "discarding vendor header before archive payload");
    }

    let target = extensions_root.join(suggested_id);
    extractor::extract_archive(&bytes[offset..], &target)
        .map_err(|e| PlatformError::ExtractionFailed(e.to_string()))?;

    let ext = host
        .load_extension(&target)
        .map_err(|e| PlatformError::LoadRejected(e.to_string()))?;

    if let Err(e) = fs::remove_file(archive_path) {
        debug!(error = %e, "could not delete download artifact");
    }

    info!(id = ext.id.as_str(), name = ext.name.as_str(), "installed extension");
    Ok(ext)
}

/// Install when a completed download looks like an extension package,
/// judged by filename extension alone.
pub fn handle_completed_download(
    host: &mut dyn ExtensionHost,
    extensions_root: &Path,
    package_extension: &str,
    download_path: &Path,
) -> Result<DownloadDisposition, PlatformError> {
    let is_package = download_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(package_extension))
        .unwrap_or(false);
    if !is_package {
        return Ok(DownloadDisposition::Ignored);
    }

    let suggested_id = download_path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_name)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "extension".to_string());

    install_from_archive(host, extensions_root, download_path, &suggested_id)
        .map(DownloadDisposition::Installed)
}

fn find_payload(bytes: &[u8]) -> Result<usize, PlatformError> {
    extractor::find_archive_offset(bytes).ok_or(PlatformError::ArchiveCorrupt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct RecordingHost {
        loaded: Vec<PathBuf>,
        reject: bool,
    }

    impl RecordingHost {
        fn new() -> Self {
            Self {
                loaded: Vec::new(),
                reject: false,
            }
        }
    }

    impl ExtensionHost for RecordingHost {
        fn load_extension(&mut self, path: &Path) -> anyhow::Result<HostExtension> {
            if self.reject {
                return Err(anyhow!("malformed manifest"));
            }
            self.loaded.push(path.to_path_buf());
            Ok(HostExtension {
                id: "loaded-ext".to_string(),
                name: "Loaded".to_string(),
                version: "1.0".to_string(),
                path: path.to_path_buf(),
                manifest: Default::default(),
            })
        }

        fn list_extensions(&self) -> Vec<HostExtension> {
            Vec::new()
        }

        fn remove_extension(&mut self, _id: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn write_package(dir: &Path, name: &str, header_len: usize) -> PathBuf {
        let mut bytes = vec![0x5A; header_len];
        bytes.extend(extractor::build_zip(&[(
            "manifest.json",
            br#"{"name": "Packaged", "version": "2.0"}"# as &[u8],
        )]));
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn vendor_header_is_stripped_before_extraction() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("extensions");
        let package = write_package(dir.path(), "pkg.crx", 12);

        let mut host = RecordingHost::new();
        let ext = install_from_archive(&mut host, &root, &package, "pkg").unwrap();

        assert_eq!(ext.id, "loaded-ext");
        assert!(root.join("pkg").join("manifest.json").is_file());
        // Artifact is deleted on success
        assert!(!package.exists());
    }

    #[test]
    fn missing_magic_is_archive_corrupt() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("extensions");
        let package = dir.path().join("junk.crx");
        fs::write(&package, b"no archive here").unwrap();

        let mut host = RecordingHost::new();
        let err = install_from_archive(&mut host, &root, &package, "junk").unwrap_err();
        assert!(matches!(err, PlatformError::ArchiveCorrupt));
        // The artifact survives failures
        assert!(package.exists());
    }

    #[test]
    fn host_rejection_keeps_extracted_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("extensions");
        let package = write_package(dir.path(), "pkg.crx", 0);

        let mut host = RecordingHost::new();
        host.reject = true;
        let err = install_from_archive(&mut host, &root, &package, "pkg").unwrap_err();

        assert!(matches!(err, PlatformError::LoadRejected(_)));
        assert!(root.join("pkg").join("manifest.json").is_file());
        assert!(package.exists());
    }

    #[test]
    fn non_package_downloads_are_ignored() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("extensions");
        let download = dir.path().join("report.pdf");
        fs::write(&download, b"pdf").unwrap();

        let mut host = RecordingHost::new();
        let disposition =
            handle_completed_download(&mut host, &root, "crx", &download).unwrap();

        assert!(matches!(disposition, DownloadDisposition::Ignored));
        assert!(host.loaded.is_empty());
    }

    #[test]
    fn package_download_installs_under_sanitized_stem() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("extensions");
        let package = write_package(dir.path(), "My Extension.crx", 4);

        let mut host = RecordingHost::new();
        let disposition =
            handle_completed_download(&mut host, &root, "crx", &package).unwrap();

        assert!(matches!(disposition, DownloadDisposition::Installed(_)));
        assert!(root.join("my-extension").join("manifest.json").is_file());
    }
}
