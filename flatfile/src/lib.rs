//! # Flatfile - schema-driven delimited file reader and writer
//!
//! Flatfile reads and writes delimited text (CSV and friends) through a
//! schema of typed columns, and projects rows into and out of tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Text file  │────▶│  Tokenizer  │────▶│   Reader    │────▶│  DataTable  │
//! │ (any encod.)│     │  (dialect)  │     │  (schema)   │     │ (projection)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                   ▲                   │
//!        │            ┌─────────────┐     ┌─────────────┐
//!        └────────────│  Formatter  │◀────│   Writer    │
//!                     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use flatfile::{ColumnType, Options, Reader, Row, Schema, Value, Writer};
//!
//! let schema = Schema::new()
//!     .add_column(ColumnType::int32("id"))?
//!     .add_column(ColumnType::string("name"))?;
//!
//! let mut writer = Writer::new(Vec::new(), schema.clone(), Options::new().with_header(true))?;
//! writer.write(&Row::new(vec![Value::Int32(1), Value::from("Ann")]))?;
//! let bytes = writer.into_inner()?;
//!
//! let mut reader = Reader::with_schema(&bytes[..], schema, Options::new().with_header(true))?;
//! let row = reader.read()?.expect("one row");
//! assert_eq!(row[0], Value::Int32(1));
//! # Ok::<(), flatfile::FlatFileError>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Typed values and rows
//! - [`schema`] - Schemas, column types, cultures and formats
//! - [`config`] - Reader/writer options
//! - [`parser`] - Dialects, tokenizer, formatter, encoding detection
//! - [`reader`] / [`writer`] - Typed record streams
//! - [`table`] - External tables and the projection
//! - [`logs`] - Session log events

// Core modules
pub mod error;
pub mod models;

// Schema and options
pub mod config;
pub mod schema;

// Text layer
pub mod parser;

// Record streams
pub mod reader;
pub mod writer;

// Tables
pub mod table;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ConvertError, FlatFileError, FlatFileResult, ParseFailure, ProjectionError,
    ReadError, SchemaError, WriteError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Row, Value};

// =============================================================================
// Re-exports - Schema
// =============================================================================

pub use schema::{ColumnKind, ColumnType, Culture, Schema};

// =============================================================================
// Re-exports - Options and dialect
// =============================================================================

pub use config::{Options, QuoteStyle, RecordSeparator};
pub use parser::{decode_content, detect_delimiter, detect_encoding, Dialect};

// =============================================================================
// Re-exports - Reader / Writer
// =============================================================================

pub use reader::{Reader, ReaderState};
pub use writer::Writer;

// =============================================================================
// Re-exports - Tables
// =============================================================================

pub use table::{
    populate, schema_from_table, write_table, Constraint, DataTable, MemoryTable, TableColumn,
};
