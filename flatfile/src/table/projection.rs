//! Moving rows between readers/writers and a [`DataTable`].
//!
//! The read path fills a table with the *formatted* text of every parsed
//! value, so a column declared `MM/dd/yyyy` shows up as `12/31/2012` rather
//! than as a native date. Null values become `None` cells.

use std::io::{BufRead, Write};

use super::{DataTable, TableColumn};
use crate::error::{ProjectionError, ProjectionResult, SchemaResult, WriteError};
use crate::logs::{log_info_indent, log_success, Component};
use crate::models::Value;
use crate::reader::Reader;
use crate::schema::{ColumnKind, ColumnType, Schema};
use crate::writer::Writer;

/// Replace the contents of `table` with every remaining row of `reader`.
///
/// Both arguments are checked before anything is read. All rows are read
/// and formatted first, so a read or format error leaves the table as it
/// was. On success the table is fully reset (columns, constraints, rows) and
/// gets one String column per schema column. Returns the number of rows added.
pub fn populate<T, R>(
    table: Option<&mut T>,
    reader: Option<&mut Reader<R>>,
) -> ProjectionResult<usize>
where
    T: DataTable + ?Sized,
    R: BufRead,
{
    let table = table.ok_or(ProjectionError::NullArgument("table"))?;
    let reader = reader.ok_or(ProjectionError::NullArgument("reader"))?;

    let schema = reader.shared_schema()?;

    let mut rows = Vec::new();
    while let Some(row) = reader.read()? {
        let number = rows.len() + 1;
        let culture = reader.culture();
        let cells = schema
            .columns()
            .iter()
            .zip(row.iter())
            .map(|(column, value)| {
                if value.is_null() {
                    return Ok(None);
                }
                column
                    .format(value, culture)
                    .map(Some)
                    .map_err(|source| ProjectionError::Format {
                        row: number,
                        source,
                    })
            })
            .collect::<ProjectionResult<Vec<_>>>()?;
        rows.push(cells);
    }

    let count = rows.len();
    table.reset();
    for column in schema.columns() {
        table.add_column(TableColumn::new(column.name(), ColumnKind::String));
    }
    for cells in rows {
        table.add_row(cells);
    }

    log_success(Component::Projection, format!("Table populated: {} rows", count));
    log_info_indent(
        Component::Projection,
        format!("Columns: {}", schema.names().join(", ")),
        1,
    );
    Ok(count)
}

/// Nullable columns with the table's names and declared kinds.
pub fn schema_from_table<T>(table: &T) -> SchemaResult<Schema>
where
    T: DataTable + ?Sized,
{
    let mut schema = Schema::new();
    for column in table.columns() {
        schema.push_column(ColumnType::new(column.name.clone(), column.kind).nullable(true))?;
    }
    Ok(schema)
}

/// Write every row of `table` through `writer`.
///
/// Table column names must equal the writer's schema names, in order. Each
/// non-null cell is parsed with the matching column type and the writer's
/// culture before it is written. Returns the number of rows written.
pub fn write_table<T, W>(
    table: Option<&T>,
    writer: Option<&mut Writer<W>>,
) -> ProjectionResult<usize>
where
    T: DataTable + ?Sized,
    W: Write,
{
    let table = table.ok_or(ProjectionError::NullArgument("table"))?;
    let writer = writer.ok_or(ProjectionError::NullArgument("writer"))?;

    let schema = writer.shared_schema();
    let table_names = table.column_names();
    let schema_names: Vec<String> = schema.names().into_iter().map(str::to_string).collect();
    if table_names != schema_names {
        return Err(ProjectionError::ColumnMismatch {
            table: table_names,
            schema: schema_names,
        });
    }

    if writer.options().is_first_record_schema {
        writer.write_schema()?;
    }

    let mut count = 0;
    for index in 0..table.row_count() {
        let Some(cells) = table.row(index) else {
            break;
        };
        if cells.len() != schema.column_count() {
            return Err(WriteError::RowLengthMismatch {
                expected: schema.column_count(),
                actual: cells.len(),
            }
            .into());
        }

        let culture = writer.culture();
        let values = schema
            .columns()
            .iter()
            .zip(cells)
            .map(|(column, cell)| match cell {
                None => Ok(Value::Null),
                Some(text) => column
                    .parse(text, culture)
                    .map_err(|source| ProjectionError::Cell {
                        row: index + 1,
                        source,
                    }),
            })
            .collect::<ProjectionResult<Vec<_>>>()?;

        writer.write_values(&values)?;
        count += 1;
    }
    writer.flush()?;

    log_success(Component::Projection, format!("Table written: {} rows", count));
    Ok(count)
}
