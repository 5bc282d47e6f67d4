//! External tables and the projection between them and readers/writers.
//!
//! A [`DataTable`] is anything that holds ordered named columns and rows of
//! optional string cells. [`MemoryTable`] is the in-memory implementation the
//! CLI uses.

pub mod projection;

pub use projection::{populate, schema_from_table, write_table};

use serde_json::{Map, Value as JsonValue};

use crate::error::{SchemaError, SchemaResult};
use crate::schema::ColumnKind;

/// A declared table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub kind: ColumnKind,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Key constraints over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
}

impl Constraint {
    pub fn columns(&self) -> &[String] {
        match self {
            Constraint::PrimaryKey(columns) | Constraint::Unique(columns) => columns,
        }
    }
}

/// Mutable tabular container filled and drained by the projection.
///
/// Cells are `None` for nulls. Implementations need not check row width;
/// the projection always adds rows as wide as the column list.
pub trait DataTable {
    /// Drop every column, constraint and row.
    fn reset(&mut self);

    fn add_column(&mut self, column: TableColumn);

    fn add_row(&mut self, cells: Vec<Option<String>>);

    fn columns(&self) -> &[TableColumn];

    fn constraints(&self) -> &[Constraint];

    fn row_count(&self) -> usize;

    fn row(&self, index: usize) -> Option<&[Option<String>]>;

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name.clone()).collect()
    }
}

// =============================================================================
// Memory Table
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    columns: Vec<TableColumn>,
    constraints: Vec<Constraint>,
    rows: Vec<Vec<Option<String>>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint; every column it names must exist.
    pub fn add_constraint(&mut self, constraint: Constraint) -> SchemaResult<()> {
        for name in constraint.columns() {
            if !self.columns.iter().any(|c| &c.name == name) {
                return Err(SchemaError::UnknownColumn(name.clone()));
            }
        }
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    /// Rows as JSON objects keyed by column name; nulls become `null`.
    pub fn to_json_records(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (column, cell) in self.columns.iter().zip(row) {
                    let value = match cell {
                        Some(text) => JsonValue::String(text.clone()),
                        None => JsonValue::Null,
                    };
                    obj.insert(column.name.clone(), value);
                }
                JsonValue::Object(obj)
            })
            .collect()
    }
}

impl DataTable for MemoryTable {
    fn reset(&mut self) {
        self.columns.clear();
        self.constraints.clear();
        self.rows.clear();
    }

    fn add_column(&mut self, column: TableColumn) {
        self.columns.push(column);
    }

    fn add_row(&mut self, cells: Vec<Option<String>>) {
        self.rows.push(cells);
    }

    fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> Option<&[Option<String>]> {
        self.rows.get(index).map(Vec::as_slice)
    }
}
