//! Purge prefixes and patterns.
//!
//! Every prefix ends at a separator so that purging `en` never touches
//! `en-us`, and purging project `7` never touches project `77`.

/// Suffix of the checksum sidecar written next to each filesystem blob.
pub const CHECKSUM_SUFFIX: &str = ".md5";

/// File-name prefix matching a project, or one of its languages.
#[must_use]
pub fn file_prefix(project_id: u64, language: Option<&str>) -> String {
    match language {
        Some(language) => format!("{}_{}_", project_id, language),
        None => format!("{}_", project_id),
    }
}

/// `SCAN MATCH` pattern matching a project, or one of its languages.
#[must_use]
pub fn redis_pattern(project_id: u64, language: Option<&str>) -> String {
    match language {
        Some(language) => format!("{}:{}:*", project_id, escape_glob(language)),
        None => format!("{}:*", project_id),
    }
}

/// Escapes the glob metacharacters understood by `SCAN MATCH`.
fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyglot_core::{CacheKey, VersionLabel};

    #[test]
    fn test_file_prefix_matches_own_entries_only() {
        let prefix = file_prefix(7, Some("en"));
        assert_eq!(prefix, "7_en_");

        assert!(CacheKey::new(7, "en", "po").file_name().starts_with(&prefix));
        assert!(CacheKey::new(7, "en", "po")
            .with_version(VersionLabel::Pinned("v2".into()))
            .file_name()
            .starts_with(&prefix));
        assert!(!CacheKey::new(7, "en-us", "po").file_name().starts_with(&prefix));
        assert!(!CacheKey::new(77, "en", "po").file_name().starts_with(&file_prefix(7, None)));
    }

    #[test]
    fn test_redis_pattern() {
        assert_eq!(redis_pattern(7, None), "7:*");
        assert_eq!(redis_pattern(7, Some("en")), "7:en:*");
        assert_eq!(redis_pattern(7, Some("e*[n]")), "7:e\\*\\[n\\]:*");
    }
}
