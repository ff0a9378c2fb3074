//! On-disk log line format
//!
//! One record per line, fields in fixed order:
//!
//! ```text
//! Trace ID: <id> Name: <name> Text: <text> Date: <YYYY/MM/DD HH:MM> User Name: <user|None> Level: <LEVEL>
//! ```
//!
//! The same format is the only source for recovering state after a
//! restart: ids and levels are read back through the literal `Trace ID:`
//! and `Level:` markers.

use std::sync::OnceLock;

use regex::Regex;

use crate::record::ErrorRecord;

pub const TRACE_ID_MARKER: &str = "Trace ID:";
pub const LEVEL_MARKER: &str = "Level:";

/// Placeholder written when a record has no user name
pub const NO_USER: &str = "None";

static LEVEL_RE: OnceLock<Regex> = OnceLock::new();

fn level_re() -> &'static Regex {
    LEVEL_RE.get_or_init(|| Regex::new(r"Level:\s*(\w+)").expect("valid level regex"))
}

/// Render a record as a log line (no trailing newline)
pub fn format_line(record: &ErrorRecord) -> String {
    format!(
        "Trace ID: {} Name: {} Text: {} Date: {} User Name: {} Level: {}",
        record.trace_id,
        record.name,
        record.text,
        record.format_date(),
        record.user_name.as_deref().filter(|u| !u.is_empty()).unwrap_or(NO_USER),
        record.level
    )
}

/// Token following the first `Trace ID:` marker, up to whitespace
pub fn extract_trace_id(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once(TRACE_ID_MARKER)?;
    rest.split_whitespace().next()
}

/// Word following the last `Level:` marker.
///
/// The level is the final field, so free text that happens to contain
/// `Level:` earlier in the line does not shadow it.
pub fn extract_level(line: &str) -> Option<&str> {
    level_re()
        .captures_iter(line)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ERROR;

    #[test]
    fn test_format_line_exact() {
        let record = ErrorRecord::new("42", "X", "Y", "2024/02/12 10:15")
            .unwrap()
            .with_level(ERROR)
            .unwrap();

        assert_eq!(
            format_line(&record),
            "Trace ID: 42 Name: X Text: Y Date: 2024/02/12 10:15 User Name: None Level: ERROR"
        );
    }

    #[test]
    fn test_format_line_with_user() {
        let record = ErrorRecord::new("001", "NullPointerError", "Attempt to dereference null pointer.", "2024/02/12 10:15")
            .unwrap()
            .with_user(Some("Alice"))
            .with_level("DEBUG")
            .unwrap();

        assert_eq!(
            format_line(&record),
            "Trace ID: 001 Name: NullPointerError Text: Attempt to dereference null pointer. \
             Date: 2024/02/12 10:15 User Name: Alice Level: DEBUG"
        );
    }

    #[test]
    fn test_empty_user_written_as_none() {
        let record = ErrorRecord::new("1", "X", "Y", "2024/02/12 10:15")
            .unwrap()
            .with_user(Some(""));
        assert!(format_line(&record).contains("User Name: None Level:"));
    }

    #[test]
    fn test_extract_trace_id() {
        assert_eq!(extract_trace_id("Trace ID: 12345"), Some("12345"));
        assert_eq!(extract_trace_id("Trace ID: 67890 Name: X"), Some("67890"));
        assert_eq!(extract_trace_id("  prefix Trace ID:abc Name: X"), Some("abc"));
        assert_eq!(extract_trace_id("Some other line"), None);
        assert_eq!(extract_trace_id("Trace ID:   "), None);
    }

    #[test]
    fn test_extract_level() {
        let line = "Trace ID: 1 Name: X Text: Y Date: 2024/02/12 10:15 User Name: None Level: WARNING";
        assert_eq!(extract_level(line), Some("WARNING"));
        assert_eq!(extract_level("no marker here"), None);
        assert_eq!(extract_level("Level:"), None);
    }

    #[test]
    fn test_extract_level_ignores_text_mentions() {
        let line = "Trace ID: 1 Name: X Text: Level: DEBUG was wrong Date: 2024/02/12 10:15 User Name: None Level: ERROR";
        assert_eq!(extract_level(line), Some("ERROR"));
    }

    #[test]
    fn test_round_trip_markers() {
        let record = ErrorRecord::new("trace-7", "X", "Y", "2024/02/12 10:15")
            .unwrap()
            .with_level("CRITICAL")
            .unwrap();
        let line = format_line(&record);

        assert_eq!(extract_trace_id(&line), Some("trace-7"));
        assert_eq!(extract_level(&line), Some("CRITICAL"));
    }
}
