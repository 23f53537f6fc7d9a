//! Export formats and their content metadata.

use crate::{PolyglotError, PolyglotResult};

/// Format used when a request does not name one.
pub const DEFAULT_FORMAT: &str = "key_value_json";

/// File extension and MIME type served for an export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMeta {
    pub format: &'static str,
    pub extension: &'static str,
    pub mime_type: &'static str,
}

const TEXT: &str = "text/plain; charset=utf-8";
const XML: &str = "application/xml";
const JSON: &str = "application/json";

const fn meta(format: &'static str, extension: &'static str, mime_type: &'static str) -> ContentMeta {
    ContentMeta {
        format,
        extension,
        mime_type,
    }
}

/// Every export format the upstream provider understands.
pub const CONTENT_META: &[ContentMeta] = &[
    meta("po", "po", TEXT),
    meta("pot", "pot", TEXT),
    meta("mo", "mo", "application/octet-stream"),
    meta("xls", "xls", "application/vnd.ms-excel"),
    meta(
        "xlsx",
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    meta("csv", "csv", "text/csv; charset=utf-8"),
    meta("ini", "ini", TEXT),
    meta("resw", "resw", XML),
    meta("resx", "resx", XML),
    meta("android_strings", "xml", XML),
    meta("apple_strings", "strings", TEXT),
    meta("xliff", "xliff", XML),
    meta("properties", "properties", TEXT),
    meta("key_value_json", "json", JSON),
    meta("json", "json", JSON),
    meta("yml", "yml", TEXT),
    meta("xmb", "xmb", XML),
    meta("xtb", "xtb", XML),
    meta("arb", "arb", JSON),
];

impl ContentMeta {
    /// Looks up the metadata for a format name.
    #[must_use]
    pub fn lookup(format: &str) -> Option<&'static Self> {
        CONTENT_META.iter().find(|m| m.format == format)
    }

    /// Like [`ContentMeta::lookup`], but unknown formats are a validation error.
    ///
    /// # Errors
    ///
    /// Returns `PolyglotError::Validation` for an unsupported format.
    pub fn for_format(format: &str) -> PolyglotResult<&'static Self> {
        Self::lookup(format)
            .ok_or_else(|| PolyglotError::Validation(format!("Unsupported export format '{}'", format)))
    }

    /// Returns `true` when the format is supported.
    #[must_use]
    pub fn is_supported(format: &str) -> bool {
        Self::lookup(format).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_supported() {
        let meta = ContentMeta::lookup(DEFAULT_FORMAT).unwrap();
        assert_eq!(meta.extension, "json");
        assert_eq!(meta.mime_type, "application/json");
    }

    #[test]
    fn test_extension_differs_from_format() {
        assert_eq!(ContentMeta::lookup("android_strings").unwrap().extension, "xml");
        assert_eq!(ContentMeta::lookup("apple_strings").unwrap().extension, "strings");
    }

    #[test]
    fn test_unknown_format() {
        assert!(ContentMeta::lookup("docx").is_none());
        assert!(!ContentMeta::is_supported("docx"));
        let err = ContentMeta::for_format("docx").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_formats_are_unique() {
        for (i, a) in CONTENT_META.iter().enumerate() {
            for b in &CONTENT_META[i + 1..] {
                assert_ne!(a.format, b.format);
            }
        }
    }
}
