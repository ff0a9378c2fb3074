//! Error types for the text log.

use thiserror::Error;

/// Which store rejected a duplicate trace id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStore {
    /// The in-memory id set recovered from today's log file
    File,
    /// The SQLite error table
    Table,
}

impl IdStore {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdStore::File => "file",
            IdStore::Table => "database",
        }
    }
}

impl std::fmt::Display for IdStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Trace ID {trace_id} already exists in the {store}.")]
    DuplicateId { trace_id: String, store: IdStore },

    #[error("Invalid date '{input}', expected YYYY/MM/DD HH:MM: {source}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid trace id '{0}': must be non-empty and contain no whitespace")]
    InvalidTraceId(String),

    #[error("Invalid level '{0}': must be a single word of letters, digits or '_'")]
    InvalidLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl LogError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, LogError::DuplicateId { .. })
    }
}

pub type Result<T> = std::result::Result<T, LogError>;
