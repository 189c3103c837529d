//! Archive payload location and extraction

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use zip::ZipArchive;

/// Zip local-file-header magic. Distribution formats may prepend a binary
/// signature block before the standard archive container; everything
/// before the first occurrence is a vendor header to discard.
pub const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Offset of the archive payload within raw package bytes.
pub fn find_archive_offset(bytes: &[u8]) -> Option<usize> {
    bytes.windows(ZIP_MAGIC.len()).position(|w| w == ZIP_MAGIC)
}

/// Unpack archive bytes into `target`, creating it as needed. Existing
/// files are overwritten. Entries that would escape the target directory
/// fail the whole extraction.
pub fn extract_archive(bytes: &[u8], target: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .context("Failed to read ZIP archive")?;

    fs::create_dir_all(target)
        .context("Failed to create extraction directory")?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)
            .context("Failed to read file from archive")?;

        let relative = match file.enclosed_name() {
            Some(name) => name.to_owned(),
            None => bail!("archive entry escapes extraction directory: {}", file.name()),
        };
        let dest = target.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create {}", dest.display()))?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut out = fs::File::create(&dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        std::io::copy(&mut file, &mut out)
            .with_context(|| format!("Failed to write {}", dest.display()))?;
    }

    Ok(())
}

/// In-memory zip fixture shared by installer tests.
#[cfg(test)]
pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn offset_is_zero_for_plain_zip() {
        let bytes = build_zip(&[("manifest.json", b"{}")]);
        assert_eq!(find_archive_offset(&bytes), Some(0));
    }

    #[test]
    fn offset_skips_vendor_header() {
        let mut bytes = vec![0xAB; 12];
        bytes.extend(build_zip(&[("manifest.json", b"{}")]));
        assert_eq!(find_archive_offset(&bytes), Some(12));
    }

    #[test]
    fn no_magic_means_no_offset() {
        assert_eq!(find_archive_offset(b"definitely not an archive"), None);
        assert_eq!(find_archive_offset(&[]), None);
    }

    #[test]
    fn extracts_nested_entries() {
        let dir = TempDir::new().unwrap();
        let bytes = build_zip(&[
            ("manifest.json", b"{\"name\": \"t\"}" as &[u8]),
            ("scripts/content.js", b"x();"),
        ]);

        extract_archive(&bytes, dir.path()).unwrap();

        assert!(dir.path().join("manifest.json").is_file());
        assert_eq!(
            fs::read_to_string(dir.path().join("scripts/content.js")).unwrap(),
            "x();"
        );
    }

    #[test]
    fn escaping_entries_fail_extraction() {
        let dir = TempDir::new().unwrap();
        let bytes = build_zip(&[("../evil.js", b"boom" as &[u8])]);

        assert!(extract_archive(&bytes, dir.path()).is_err());
        assert!(!dir.path().parent().unwrap().join("evil.js").exists());
    }

    #[test]
    fn garbage_bytes_fail_extraction() {
        let dir = TempDir::new().unwrap();
        assert!(extract_archive(b"PK\x03\x04 but not really", dir.path()).is_err());
    }
}
