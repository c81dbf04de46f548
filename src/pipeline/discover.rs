//! File discovery: walk a directory tree and keep convertible files.
//!
//! Matching is by extension only, case-insensitive, against the normalised
//! allow-list held in [`crate::config::RunConfig`]. Any walk error — the root
//! itself or a single entry's metadata — aborts the run: a partially scanned
//! tree would silently convert a subset and the caller could not tell which.

use crate::error::RelayError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Recursively enumerate all regular files under `root` whose extension is
/// in `extensions` (lowercase, leading dot).
///
/// Order is directory-walk order and is not guaranteed stable across runs.
pub fn discover_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, RelayError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| RelayError::Discovery {
            root: root.to_path_buf(),
            source: e,
        })?;
        if entry.file_type().is_file() && is_supported_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    debug!("discovered {} convertible files under {}", files.len(), root.display());
    Ok(files)
}

/// Whether the path's extension (normalised) is allow-listed.
fn is_supported_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let dotted = format!(".{}", ext.to_lowercase());
            extensions.iter().any(|s| *s == dotted)
        }
        None => false,
    }
}

/// The extension of `path` without its dot, lowercased — the wire-level
/// source type.
pub fn source_type(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn includes_only_allowlisted_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.doc"), b"x").unwrap();
        fs::write(dir.path().join("b.txt"), b"x").unwrap();
        fs::write(dir.path().join("c.ppt"), b"x").unwrap();
        fs::write(dir.path().join("noext"), b"x").unwrap();

        let mut found = discover_files(dir.path(), &exts(&[".doc", ".ppt"])).unwrap();
        found.sort();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.doc", "c.ppt"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("UPPER.DOC"), b"x").unwrap();
        fs::write(dir.path().join("Mixed.Wps"), b"x").unwrap();

        let found = discover_files(dir.path(), &exts(&[".doc", ".wps"])).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn recurses_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("deep/nested")).unwrap();
        fs::write(dir.path().join("deep/nested/slide.dps"), b"x").unwrap();

        let found = discover_files(dir.path(), &exts(&[".dps"])).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("deep/nested/slide.dps"));
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let err = discover_files(Path::new("/definitely/not/here"), &exts(&[".doc"]));
        assert!(matches!(err, Err(RelayError::Discovery { .. })));
    }

    #[test]
    fn directories_are_never_matched() {
        let dir = tempfile::tempdir().unwrap();
        // A directory whose name ends in an allow-listed extension.
        fs::create_dir(dir.path().join("folder.doc")).unwrap();

        let found = discover_files(dir.path(), &exts(&[".doc"])).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn source_type_strips_dot_and_lowercases() {
        assert_eq!(source_type(Path::new("A.DOC")), "doc");
        assert_eq!(source_type(Path::new("b.wps")), "wps");
        assert_eq!(source_type(Path::new("noext")), "");
    }
}
