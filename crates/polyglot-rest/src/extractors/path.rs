//! Path parameter parsing.

use polyglot_core::{PolyglotError, PolyglotResult};

const LANGUAGE_MIN_LEN: usize = 2;
const LANGUAGE_MAX_LEN: usize = 16;

/// Parses a numeric project id.
pub fn parse_project_id(value: &str) -> PolyglotResult<u64> {
    value
        .parse::<u64>()
        .map_err(|_| PolyglotError::Validation(format!("Invalid project id '{}'", value)))
}

/// Checks a language code against `[A-Za-z0-9-]{2,16}`.
pub fn parse_language(value: &str) -> PolyglotResult<&str> {
    let valid = (LANGUAGE_MIN_LEN..=LANGUAGE_MAX_LEN).contains(&value.len())
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(value)
    } else {
        Err(PolyglotError::Validation(format!(
            "Invalid language code '{}'",
            value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_id() {
        assert_eq!(parse_project_id("42").unwrap(), 42);
        assert!(parse_project_id("-1").is_err());
        assert!(parse_project_id("abc").is_err());
    }

    #[test]
    fn test_parse_language() {
        assert!(parse_language("en").is_ok());
        assert!(parse_language("en-US").is_ok());
        assert!(parse_language("zh-Hant-TW").is_ok());
        assert!(parse_language("e").is_err());
        assert!(parse_language("en_us").is_err());
        assert!(parse_language("../etc").is_err());
        assert!(parse_language("abcdefghijklmnopq").is_err());
    }
}
