//! Target-format resolution.
//!
//! A fixed table maps each office extension to its modern counterpart
//! (`doc → docx`, `ppt → pptx`, …). Anything without an entry falls back to
//! PDF. An explicit global override short-circuits the table entirely.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Target format used when the source extension has no table entry.
pub const DEFAULT_TARGET: &str = "pdf";

/// Every source format the service can flatten to PDF. Used to widen the
/// discovery allow-list when the caller asks for `pdf` globally without
/// naming extensions.
pub const PDF_COMPATIBLE: &[&str] = &[
    "doc", "docx", "wps", "et", "xls", "xlsx", "txt", "csv", "tsv", "dps", "ppt", "pptx",
];

static TARGET_TYPE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ppt", "pptx"),
        ("dps", "pptx"),
        ("doc", "docx"),
        ("wps", "docx"),
        ("xls", "xlsx"),
        ("et", "xlsx"),
    ])
});

/// Resolve the target format for a source extension (no leading dot).
///
/// Priority: explicit override, then the fixed table, then
/// [`DEFAULT_TARGET`].
pub fn resolve_target(source_ext: &str, target_override: Option<&str>) -> String {
    if let Some(t) = target_override {
        if !t.is_empty() {
            return t.to_string();
        }
    }
    TARGET_TYPE_MAP
        .get(source_ext.to_lowercase().as_str())
        .map(|t| t.to_string())
        .unwrap_or_else(|| DEFAULT_TARGET.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_entries() {
        assert_eq!(resolve_target("doc", None), "docx");
        assert_eq!(resolve_target("wps", None), "docx");
        assert_eq!(resolve_target("ppt", None), "pptx");
        assert_eq!(resolve_target("dps", None), "pptx");
        assert_eq!(resolve_target("xls", None), "xlsx");
        assert_eq!(resolve_target("et", None), "xlsx");
    }

    #[test]
    fn unmapped_extension_falls_back_to_pdf() {
        assert_eq!(resolve_target("txt", None), "pdf");
        assert_eq!(resolve_target("csv", None), "pdf");
    }

    #[test]
    fn override_wins_over_table() {
        assert_eq!(resolve_target("doc", Some("pdf")), "pdf");
        assert_eq!(resolve_target("txt", Some("docx")), "docx");
    }

    #[test]
    fn empty_override_is_ignored() {
        assert_eq!(resolve_target("doc", Some("")), "docx");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(resolve_target("DOC", None), "docx");
        assert_eq!(resolve_target("Ppt", None), "pptx");
    }
}
