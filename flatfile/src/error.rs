//! Error types for the flat-file engine.
//!
//! One enum per layer:
//!
//! - [`SchemaError`] - Schema and column declaration errors
//! - [`ConfigError`] - Options / dialect errors
//! - [`ConvertError`] - Per-column parse and format errors
//! - [`ReadError`] - Reader errors (tokenizing, field counts, parsing)
//! - [`WriteError`] - Writer errors
//! - [`ProjectionError`] - Table projection errors
//! - [`FlatFileError`] - Top-level error wrapping all of the above
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::schema::ColumnKind;

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors raised while building a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A column with this name already exists.
    #[error("Duplicate column name: '{0}'")]
    DuplicateName(String),

    /// Column names must not be empty.
    #[error("Column {0} has an empty name")]
    EmptyName(usize),

    /// Lookup of a column that is not declared.
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// A format string that cannot be applied to the column kind.
    #[error("Invalid format '{format}' for {kind} column '{column}': {message}")]
    InvalidFormat {
        column: String,
        kind: ColumnKind,
        format: String,
        message: String,
    },

    /// Malformed schema document.
    #[error("Schema JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in reader/writer options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two dialect characters collide (e.g. delimiter == quote).
    #[error("Conflicting dialect characters: {0}")]
    ConflictingDialect(String),

    /// An environment variable holds an unusable value.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    /// A date pattern in the culture could not be compiled.
    #[error("Invalid culture pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Malformed options document.
    #[error("Options JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Why a raw field could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// The text is not a value of the column kind at all.
    KindMismatch,
    /// The text did not match the column's explicit input format.
    FormatMismatch,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailure::KindMismatch => write!(f, "kind mismatch"),
            ParseFailure::FormatMismatch => write!(f, "format mismatch"),
        }
    }
}

/// Errors converting a single value to or from text.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Raw text could not be converted to the column kind.
    #[error("Column '{column}' ({kind}): cannot parse '{raw}' ({failure})")]
    Parse {
        column: String,
        kind: ColumnKind,
        failure: ParseFailure,
        raw: String,
    },

    /// A value whose runtime type does not fit the column kind.
    #[error("Column '{column}' ({kind}): cannot format {found} value")]
    Format {
        column: String,
        kind: ColumnKind,
        found: &'static str,
    },

    /// Null given to a non-nullable column.
    #[error("Column '{0}' is not nullable")]
    NullNotAllowed(String),
}

impl ConvertError {
    /// Name of the column the error refers to.
    pub fn column(&self) -> &str {
        match self {
            ConvertError::Parse { column, .. } => column,
            ConvertError::Format { column, .. } => column,
            ConvertError::NullNotAllowed(column) => column,
        }
    }
}

// =============================================================================
// Read Errors
// =============================================================================

/// Errors produced while reading records.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read from the source.
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// Source bytes could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The tokenizer could not make sense of the record.
    #[error("Line {line}: malformed record: {reason}")]
    Malformed { line: usize, reason: String },

    /// The record has more or fewer fields than the schema.
    #[error("Line {line}: expected {expected} fields, found {actual}")]
    FieldCountMismatch {
        expected: usize,
        actual: usize,
        line: usize,
    },

    /// A field failed its column conversion.
    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ConvertError,
    },

    /// The header could not be turned into a schema.
    #[error("Header error: {0}")]
    Schema(#[from] SchemaError),
}

impl ReadError {
    /// Line number the error refers to, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ReadError::Malformed { line, .. }
            | ReadError::FieldCountMismatch { line, .. }
            | ReadError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

// =============================================================================
// Write Errors
// =============================================================================

/// Errors produced while writing records.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to write to the sink.
    #[error("Failed to write sink: {0}")]
    Io(#[from] std::io::Error),

    /// The row width differs from the schema width.
    #[error("Row has {actual} values, schema has {expected} columns")]
    RowLengthMismatch { expected: usize, actual: usize },

    /// A value could not be formatted.
    #[error("Row {row}: {source}")]
    Format {
        row: usize,
        #[source]
        source: ConvertError,
    },
}

// =============================================================================
// Projection Errors
// =============================================================================

/// Errors from the table projection adapter.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A required argument was not supplied.
    #[error("Argument '{0}' must not be null")]
    NullArgument(&'static str),

    /// Table columns do not line up with the writer schema.
    #[error("Table columns {table:?} do not match schema columns {schema:?}")]
    ColumnMismatch {
        table: Vec<String>,
        schema: Vec<String>,
    },

    /// A table cell could not be parsed into its column kind.
    #[error("Table row {row}: {source}")]
    Cell {
        row: usize,
        #[source]
        source: ConvertError,
    },

    /// A value could not be formatted for the table.
    #[error("Record {row}: {source}")]
    Format {
        row: usize,
        #[source]
        source: ConvertError,
    },

    /// Reader failure while populating.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Writer failure while extracting.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
}

// =============================================================================
// Top-level Error
// =============================================================================

/// Top-level error for callers that don't care which layer failed.
#[derive(Debug, Error)]
pub enum FlatFileError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for value conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for reading.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for writing.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for table projection.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Result type for top-level operations.
pub type FlatFileResult<T> = Result<T, FlatFileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ReadError -> ProjectionError -> FlatFileError
        let read_err = ReadError::FieldCountMismatch {
            expected: 4,
            actual: 3,
            line: 7,
        };
        let projection_err: ProjectionError = read_err.into();
        let top: FlatFileError = projection_err.into();
        let msg = top.to_string();
        assert!(msg.contains("Line 7"));
        assert!(msg.contains("expected 4 fields, found 3"));
    }

    #[test]
    fn test_parse_error_carries_context() {
        let err = ReadError::Parse {
            line: 12,
            source: ConvertError::Parse {
                column: "id".into(),
                kind: ColumnKind::Int32,
                failure: ParseFailure::KindMismatch,
                raw: "abc".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 12"));
        assert!(msg.contains("'id'"));
        assert!(msg.contains("'abc'"));
        assert!(msg.contains("kind mismatch"));
        assert_eq!(err.line(), Some(12));
    }

    #[test]
    fn test_convert_error_column() {
        let err = ConvertError::NullNotAllowed("avg".into());
        assert_eq!(err.column(), "avg");
        assert!(err.to_string().contains("not nullable"));
    }
}
