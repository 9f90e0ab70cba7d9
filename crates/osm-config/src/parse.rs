//! Parsers for raw option values.
//!
//! Every parser is lenient: malformed input never errors, the caller gets
//! `None` or the supplied default and decides what to log.

use tracing::warn;

/// Parse a boolean option value.
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`, trimming
/// surrounding whitespace. Anything else is `None`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Parse a positive integer no greater than `max`.
///
/// Empty, unparsable, zero, negative and out-of-range values all yield
/// `default`.
pub fn parse_positive_int(value: &str, default: usize, max: usize) -> usize {
    let value = value.trim();
    if value.is_empty() {
        return default;
    }

    let parsed: i64 = match value.parse() {
        Ok(n) => n,
        Err(e) => {
            warn!("invalid positive integer {:?}: {}", value, e);
            return default;
        }
    };

    if parsed < 1 || parsed as u64 > max as u64 {
        return default;
    }

    parsed as usize
}

/// Split a path list on commas and the platform list separator.
///
/// Blank entries are dropped. Returns an empty vector for blank input.
pub fn parse_path_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == LIST_SEPARATOR)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(windows)]
const LIST_SEPARATOR: char = ';';
#[cfg(not(windows))]
const LIST_SEPARATOR: char = ':';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_accepted_spellings() {
        for v in ["1", "t", "T", "TRUE", "true", "True", " true "] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
    }

    #[test]
    fn test_parse_bool_rejects_garbage() {
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("tRuE"), None);
    }

    #[test]
    fn test_parse_positive_int_in_range() {
        assert_eq!(parse_positive_int("5", 10, 100), 5);
        assert_eq!(parse_positive_int(" 100 ", 10, 100), 100);
        assert_eq!(parse_positive_int("1", 10, 100), 1);
    }

    #[test]
    fn test_parse_positive_int_falls_back_to_default() {
        assert_eq!(parse_positive_int("", 10, 100), 10);
        assert_eq!(parse_positive_int("abc", 10, 100), 10);
        assert_eq!(parse_positive_int("0", 10, 100), 10);
        assert_eq!(parse_positive_int("-3", 10, 100), 10);
        assert_eq!(parse_positive_int("101", 10, 100), 10);
        assert_eq!(parse_positive_int("99999999999999999999", 10, 100), 10);
    }

    #[test]
    fn test_parse_path_list_commas() {
        assert_eq!(parse_path_list("a, b ,,c"), vec!["a", "b", "c"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_path_list_platform_separator() {
        assert_eq!(parse_path_list("/x:/y,/z"), vec!["/x", "/y", "/z"]);
    }

    #[test]
    fn test_parse_path_list_blank() {
        assert!(parse_path_list("").is_empty());
        assert!(parse_path_list("  , ,").is_empty());
    }
}
