//! Schemas: ordered, named collections of typed columns.
//!
//! A schema is built once (declared, loaded from JSON, or inferred from a
//! header record) and then shared read-only by readers and writers.
//!
//! ```rust
//! use flatfile::schema::{ColumnType, Schema};
//!
//! let schema = Schema::new()
//!     .add_column(ColumnType::int32("id"))?
//!     .add_column(ColumnType::string("name"))?
//!     .add_column(ColumnType::date_time("created").with_format("MM/dd/yyyy")?)?
//!     .add_column(ColumnType::decimal("avg"))?;
//!
//! assert_eq!(schema.column_count(), 4);
//! assert_eq!(schema.index_of("created"), Some(2));
//! # Ok::<(), flatfile::SchemaError>(())
//! ```

pub mod column;
pub mod culture;
pub mod format;

pub use column::{ColumnKind, ColumnSpec, ColumnType};
pub use culture::{Culture, CultureConfig};
pub use format::{ColumnFormat, DatePattern, NumberFormat};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{SchemaError, SchemaResult};

/// Ordered set of column types, addressable by position and by name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    columns: Vec<ColumnType>,
    index: HashMap<String, usize>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

/// JSON layout of a schema document.
#[derive(Debug, Serialize, Deserialize)]
struct SchemaDocument {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, returning the schema for chaining.
    pub fn add_column(mut self, column: ColumnType) -> SchemaResult<Self> {
        self.push_column(column)?;
        Ok(self)
    }

    /// Append a column in place.
    pub fn push_column(&mut self, column: ColumnType) -> SchemaResult<()> {
        if column.name().is_empty() {
            return Err(SchemaError::EmptyName(self.columns.len()));
        }
        if self.index.contains_key(column.name()) {
            return Err(SchemaError::DuplicateName(column.name().to_string()));
        }
        self.index.insert(column.name().to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// One String column per header field, same names and order.
    pub fn infer_from_header<I, S>(fields: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut schema = Self::new();
        for field in fields {
            schema.push_column(ColumnType::string(field.as_ref()))?;
        }
        Ok(schema)
    }

    /// String columns named `Column1..ColumnN`, for headerless undeclared files.
    pub fn anonymous(width: usize) -> Self {
        let mut schema = Self::new();
        for i in 1..=width {
            let name = format!("Column{}", i);
            schema.index.insert(name.clone(), schema.columns.len());
            schema.columns.push(ColumnType::string(name));
        }
        schema
    }

    /// Load a schema document: `{"columns": [{"name": .., "kind": ..}, ..]}`.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        let mut schema = Self::new();
        for spec in document.columns {
            schema.push_column(ColumnType::try_from(spec)?)?;
        }
        Ok(schema)
    }

    pub fn to_json(&self) -> SchemaResult<String> {
        let document = SchemaDocument {
            columns: self.columns.iter().map(ColumnType::to_spec).collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnType> {
        self.columns.get(index)
    }

    pub fn column_by_name(&self, name: &str) -> SchemaResult<&ColumnType> {
        self.index_of(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| SchemaError::UnknownColumn(name.to_string()))
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnType::name).collect()
    }
}
