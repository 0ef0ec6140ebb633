//! Error types and classification for ipspace tables.
//!
//! This crate provides:
//! - [`TableError`] - Top-level error enum for schema, load and decode errors
//! - [`ValueError`] - Why a single column token was rejected
//! - [`ErrorCategory`] for deciding whether a diagnostic cost a line, a column, or the load

use thiserror::Error;

/// Top-level error type for ipspace tables.
#[derive(Error, Debug)]
pub enum TableError {
    /// A line's range field did not parse; the line was skipped.
    #[error("Invalid range specification on line {line}: '{token}' ({reason})")]
    RangeParse {
        line: usize,
        token: String,
        reason: String,
    },

    /// A column token was rejected; the row was still committed.
    #[error("Value \"{value}\" at index {column} ({name}) on line {line} is invalid: {source}")]
    ColumnParse {
        line: usize,
        column: usize,
        name: String,
        value: String,
        #[source]
        source: ValueError,
    },

    /// Source file not found
    #[error("Source not found: {0}")]
    NotFound(String),

    /// I/O error while reading a source
    #[error("I/O error: {0}")]
    Io(String),

    /// Column used before it was added to a table
    #[error("Column '{0}' is not bound to a table")]
    Unbound(String),

    /// Column added to a table twice
    #[error("Column '{0}' is already bound to a table")]
    AlreadyBound(String),

    /// Column added after the table started parsing
    #[error("Schema is frozen, cannot add column '{0}' after parsing started")]
    SchemaFrozen(String),

    /// Row data does not cover the column's slot
    #[error("Row of {row_size} bytes does not hold column '{name}'")]
    ShortRow { name: String, row_size: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored column bytes could not be decoded
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Reasons a column rejects a token or fails to decode its stored bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Token is not a boolean literal
    #[error("'{0}' is not a boolean value")]
    InvalidFlag(String),

    /// Sub-tag missing from a flag group vocabulary
    #[error("Tag \"{0}\" is not recognized")]
    UnknownFlag(String),

    /// Flag index past the end of the vocabulary
    #[error("Flag index {index} is out of range for {count} flags")]
    FlagOutOfRange { index: usize, count: usize },

    /// Tag column has no room for another distinct value
    #[error("Tag vocabulary is full ({limit} distinct values)")]
    VocabularyOverflow { limit: usize },

    /// Stored tag byte has no vocabulary entry
    #[error("Tag index {0} has no vocabulary entry")]
    UnknownTag(u8),

    /// String column handed a token without persisted storage
    #[error("Token was not persisted into table storage")]
    NotPersisted,

    /// Persisted string does not fit a 32-bit reference
    #[error("Persisted string at offset {offset} with length {len} exceeds reference range")]
    TooLarge { offset: usize, len: usize },

    /// Stored string reference points outside the arena or at invalid UTF-8
    #[error("Stored string reference is corrupt")]
    CorruptString,
}

/// Error classification for load diagnostics.
///
/// Used by callers that want strict validation on top of the best-effort load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A whole input line was dropped
    Line,

    /// A single column value was dropped, the row was kept
    Column,

    /// The schema or API was misused
    Schema,

    /// The source could not be read at all
    Source,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Line => write!(f, "Line"),
            Self::Column => write!(f, "Column"),
            Self::Schema => write!(f, "Schema"),
            Self::Source => write!(f, "Source"),
        }
    }
}

/// Classifies an error by the amount of data it cost.
pub fn classify_error(error: &TableError) -> ErrorCategory {
    match error {
        TableError::RangeParse { .. } => ErrorCategory::Line,
        TableError::ColumnParse { .. } => ErrorCategory::Column,
        TableError::Value(_) => ErrorCategory::Column,
        TableError::ShortRow { .. } => ErrorCategory::Column,
        TableError::NotFound(_) => ErrorCategory::Source,
        TableError::Io(_) => ErrorCategory::Source,
        TableError::Unbound(_) => ErrorCategory::Schema,
        TableError::AlreadyBound(_) => ErrorCategory::Schema,
        TableError::SchemaFrozen(_) => ErrorCategory::Schema,
        TableError::Config(_) => ErrorCategory::Schema,
    }
}

/// Result type alias using TableError.
pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_line_and_column() {
        let line = TableError::RangeParse {
            line: 3,
            token: "10.1.1".to_string(),
            reason: "bad address".to_string(),
        };
        assert_eq!(classify_error(&line), ErrorCategory::Line);

        let column = TableError::ColumnParse {
            line: 3,
            column: 2,
            name: "flags".to_string(),
            value: "bogus".to_string(),
            source: ValueError::UnknownFlag("bogus".to_string()),
        };
        assert_eq!(classify_error(&column), ErrorCategory::Column);
    }

    #[test]
    fn test_classification_source() {
        let error = TableError::NotFound("/tmp/ranges.csv".to_string());
        assert_eq!(classify_error(&error), ErrorCategory::Source);
    }

    #[test]
    fn test_column_error_display() {
        let error = TableError::ColumnParse {
            line: 7,
            column: 2,
            name: "flags".to_string(),
            value: "prod;bogus".to_string(),
            source: ValueError::UnknownFlag("bogus".to_string()),
        };
        let text = error.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("prod;bogus"));
        assert!(text.contains("bogus\" is not recognized"));
    }

    #[test]
    fn test_value_error_converts() {
        let error: TableError = ValueError::UnknownTag(9).into();
        assert_eq!(classify_error(&error), ErrorCategory::Column);
        assert_eq!(ErrorCategory::Column.to_string(), "Column");
    }
}
