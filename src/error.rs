//! Error taxonomy for the extension platform

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced to callers of user-initiated operations.
///
/// Background work (bulk loading, icon derivation, content-script reads)
/// degrades to a safe default and logs instead of returning these.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("archive is corrupt: no zip signature found")]
    ArchiveCorrupt,

    #[error("failed to extract archive: {0}")]
    ExtractionFailed(String),

    #[error("extension load rejected by host: {0}")]
    LoadRejected(String),

    #[error("manifest.json missing in {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("host rejected removal of extension {0}")]
    RemovalFailed(String),

    #[error("popup failed to load: {0}")]
    PopupLoadFailed(String),
}
