//! Destination-path resolution with collision-safe naming.
//!
//! Two placement modes:
//!
//! * No output root — the destination sits beside the source with its
//!   extension replaced by the target type; the original is later archived.
//! * Output root configured — the destination mirrors the source's path
//!   relative to the scan root, re-rooted under the output root. Parent
//!   directories are created idempotently; concurrent tasks may race to
//!   create the same parent and `create_dir_all` treats "already exists" as
//!   success.
//!
//! Collision policy: when the computed destination already exists, the
//! original file name (extension included) is inserted in parentheses before
//! the new extension — `report.docx` becomes `report_(report.doc).docx`.
//! One level only; if the disambiguated path also exists the task fails with
//! [`TaskError::OutputConflict`] rather than overwriting anything.

use crate::error::TaskError;
use std::path::{Path, PathBuf};

/// Compute the destination for a converted file.
///
/// The uniqueness guarantee is best-effort against the filesystem state at
/// inspection time; there is no cross-task locking. Each task's destination
/// is otherwise task-exclusive, so the race window only matters for two
/// sources mapping to the same output name.
pub fn resolve_output(
    source: &Path,
    target_type: &str,
    scan_root: &Path,
    output_root: Option<&Path>,
) -> Result<PathBuf, TaskError> {
    let candidate = match output_root {
        None => source.with_extension(target_type),
        Some(root) => {
            let rel = source.strip_prefix(scan_root).unwrap_or(source);
            let dest = root.join(rel).with_extension(target_type);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(|e| TaskError::Write {
                    path: dest.clone(),
                    detail: format!("failed to create output directory: {e}"),
                })?;
            }
            dest
        }
    };

    if !candidate.exists() {
        return Ok(candidate);
    }

    let fallback = disambiguate(&candidate, source);
    if fallback.exists() {
        return Err(TaskError::OutputConflict {
            path: candidate,
            fallback,
        });
    }
    Ok(fallback)
}

/// Insert `_({original file name})` before the candidate's extension.
fn disambiguate(candidate: &Path, source: &Path) -> PathBuf {
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let original = source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    candidate.with_file_name(format!("{stem}_({original}).{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn beside_source_with_replaced_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.doc");
        fs::write(&source, b"x").unwrap();

        let out = resolve_output(&source, "docx", dir.path(), None).unwrap();
        assert_eq!(out, dir.path().join("report.docx"));
    }

    #[test]
    fn existing_destination_gets_disambiguated() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.doc");
        fs::write(&source, b"x").unwrap();
        fs::write(dir.path().join("report.docx"), b"old").unwrap();

        let out = resolve_output(&source, "docx", dir.path(), None).unwrap();
        assert_eq!(out, dir.path().join("report_(report.doc).docx"));
    }

    #[test]
    fn second_collision_fails_instead_of_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.doc");
        fs::write(&source, b"x").unwrap();
        fs::write(dir.path().join("report.docx"), b"old").unwrap();
        fs::write(dir.path().join("report_(report.doc).docx"), b"older").unwrap();

        let err = resolve_output(&source, "docx", dir.path(), None).unwrap_err();
        assert!(matches!(err, TaskError::OutputConflict { .. }));
    }

    #[test]
    fn output_root_mirrors_relative_path() {
        let scan = tempfile::tempdir().unwrap();
        let out_root = tempfile::tempdir().unwrap();
        fs::create_dir_all(scan.path().join("sub/deep")).unwrap();
        let source = scan.path().join("sub/deep/slide.ppt");
        fs::write(&source, b"x").unwrap();

        let out = resolve_output(&source, "pptx", scan.path(), Some(out_root.path())).unwrap();
        assert_eq!(out, out_root.path().join("sub/deep/slide.pptx"));
        // Parent directories must exist afterwards.
        assert!(out.parent().unwrap().is_dir());
    }

    #[test]
    fn output_root_parent_creation_is_idempotent() {
        let scan = tempfile::tempdir().unwrap();
        let out_root = tempfile::tempdir().unwrap();
        fs::create_dir_all(scan.path().join("sub")).unwrap();
        let source = scan.path().join("sub/sheet.xls");
        fs::write(&source, b"x").unwrap();

        // Two resolutions racing to the same parent both succeed.
        let a = resolve_output(&source, "xlsx", scan.path(), Some(out_root.path())).unwrap();
        let b = resolve_output(&source, "xlsx", scan.path(), Some(out_root.path())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn multi_dot_names_replace_only_last_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.v2.doc");
        fs::write(&source, b"x").unwrap();

        let out = resolve_output(&source, "docx", dir.path(), None).unwrap();
        assert_eq!(out, dir.path().join("report.v2.docx"));
    }
}
