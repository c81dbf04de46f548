//! Post-conversion archival of source files.
//!
//! After a converted output is safely on disk (and only when no explicit
//! output root is configured), the original moves into a backup tree that
//! mirrors its path relative to the scan root.
//!
//! The move is a rename fast path with a copy → verify → remove fallback:
//! rename is atomic on the same filesystem, and when it fails (typically a
//! cross-device backup root) the fallback guarantees the worst interrupted
//! state is a duplicate, never a lost original.

use crate::error::ArchiveError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Move `source` into the backup tree, mirroring its path relative to
/// `scan_root`. Returns the archive location.
pub async fn archive_original(
    source: &Path,
    scan_root: &Path,
    backup_root: &Path,
) -> Result<PathBuf, ArchiveError> {
    let rel = source.strip_prefix(scan_root).unwrap_or(source);
    let dest = backup_root.join(rel);

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ArchiveError::CreateDir {
                path: parent.to_path_buf(),
                detail: e.to_string(),
            })?;
    }

    match tokio::fs::rename(source, &dest).await {
        Ok(()) => {
            debug!("archived {} -> {}", source.display(), dest.display());
            Ok(dest)
        }
        Err(rename_err) => {
            debug!(
                "rename to {} failed ({rename_err}); falling back to copy",
                dest.display()
            );
            copy_verify_remove(source, &dest).await
        }
    }
}

/// Cross-device fallback: copy, check the byte count, then delete the
/// source. An incomplete copy is removed and the source kept.
async fn copy_verify_remove(source: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
    let expected = tokio::fs::metadata(source)
        .await
        .map_err(|e| ArchiveError::Move {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            detail: e.to_string(),
        })?
        .len();

    let copied = tokio::fs::copy(source, dest)
        .await
        .map_err(|e| ArchiveError::Move {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            detail: e.to_string(),
        })?;

    if copied != expected {
        let _ = tokio::fs::remove_file(dest).await;
        return Err(ArchiveError::Verify {
            from: source.to_path_buf(),
            copied,
            expected,
        });
    }

    tokio::fs::remove_file(source)
        .await
        .map_err(|e| ArchiveError::Move {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            detail: e.to_string(),
        })?;

    debug!("archived {} -> {} (copy fallback)", source.display(), dest.display());
    Ok(dest.to_path_buf())
}
