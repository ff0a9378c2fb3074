//! Error records
//!
//! One logged error: trace id, name, text, timestamp, optional user and a
//! level tag. Construction normalises the fields so that a record always
//! renders to exactly one log line.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{LogError, Result};

/// Timestamp format used both for input and for the log line
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Maximum characters kept from `name`
pub const MAX_NAME_CHARS: usize = 128;

/// Maximum characters kept from `text`
pub const MAX_TEXT_CHARS: usize = 1024;

// Level tags. The set is open: any single `\w+` word is accepted as a level.
pub const DEBUG: &str = "DEBUG";
pub const INFO: &str = "INFO";
pub const WARNING: &str = "WARNING";
pub const ERROR: &str = "ERROR";
pub const CRITICAL: &str = "CRITICAL";

pub const DEFAULT_LEVEL: &str = INFO;

static LEVEL_TAG_RE: OnceLock<Regex> = OnceLock::new();

/// Whether `level` is read back unchanged from a log line
pub fn is_valid_level(level: &str) -> bool {
    LEVEL_TAG_RE
        .get_or_init(|| Regex::new(r"^\w+$").expect("valid level tag regex"))
        .is_match(level)
}

/// A single error record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub trace_id: String,
    pub name: String,
    pub text: String,
    pub date: NaiveDateTime,
    pub user_name: Option<String>,
    pub level: String,
}

impl ErrorRecord {
    /// Build a record at the default level.
    ///
    /// `trace_id` accepts anything printable (numbers included). `name` and
    /// `text` are truncated to [`MAX_NAME_CHARS`] / [`MAX_TEXT_CHARS`]
    /// characters. `date` must match [`DATE_FORMAT`].
    pub fn new(trace_id: impl ToString, name: &str, text: &str, date: &str) -> Result<Self> {
        let trace_id = trace_id.to_string();
        if trace_id.is_empty() || trace_id.chars().any(char::is_whitespace) {
            return Err(LogError::InvalidTraceId(trace_id));
        }

        let date = parse_date(date)?;

        Ok(Self {
            trace_id,
            name: truncate_chars(&single_line(name), MAX_NAME_CHARS),
            text: truncate_chars(&single_line(text), MAX_TEXT_CHARS),
            date,
            user_name: None,
            level: DEFAULT_LEVEL.to_string(),
        })
    }

    /// Set the user name
    pub fn with_user(mut self, user_name: Option<&str>) -> Self {
        self.user_name = user_name.map(single_line);
        self
    }

    /// Set the level tag. Levels must be a single `\w+` word so that the
    /// recovery scan finds them under the same tag after a restart.
    pub fn with_level(mut self, level: &str) -> Result<Self> {
        if !is_valid_level(level) {
            return Err(LogError::InvalidLevel(level.to_string()));
        }
        self.level = level.to_string();
        Ok(self)
    }

    pub fn format_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Parse a `YYYY/MM/DD HH:MM` timestamp
pub fn parse_date(input: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, DATE_FORMAT).map_err(|source| LogError::Parse {
        input: input.to_string(),
        source,
    })
}

/// Keep at most `max` characters (never splits a UTF-8 sequence)
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}
