//! Typed record writer.
//!
//! Formats each value through its column type and joins the fields with the
//! dialect's [`Formatter`]. One record is written to the sink per call.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::config::Options;
use crate::error::{ConfigResult, FlatFileResult, WriteError, WriteResult};
use crate::logs::{log_info, Component};
use crate::models::{Row, Value};
use crate::parser::Formatter;
use crate::schema::{Culture, Schema};

/// Forward-only writer of typed rows.
pub struct Writer<W: Write> {
    sink: W,
    schema: Arc<Schema>,
    options: Options,
    formatter: Formatter,
    header_written: bool,
    rows_written: usize,
    buf: String,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W, schema: impl Into<Arc<Schema>>, options: Options) -> ConfigResult<Self> {
        let formatter = Formatter::new(&options.dialect()?);
        Ok(Self {
            sink,
            schema: schema.into(),
            options,
            formatter,
            header_written: false,
            rows_written: 0,
            buf: String::new(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn culture(&self) -> &Culture {
        &self.options.culture
    }

    /// Data records written so far, header excluded.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Write the column names as a header record.
    ///
    /// Only the first call writes anything.
    pub fn write_schema(&mut self) -> WriteResult<()> {
        if self.header_written {
            return Ok(());
        }
        self.buf.clear();
        self.formatter.write_record(&self.schema.names(), &mut self.buf);
        self.sink.write_all(self.buf.as_bytes())?;
        self.header_written = true;
        log_info(
            Component::Writer,
            format!("Header written: {}", self.schema.names().join(", ")),
        );
        Ok(())
    }

    pub fn write(&mut self, row: &Row) -> WriteResult<()> {
        self.write_values(row.values())
    }

    pub fn write_values(&mut self, values: &[Value]) -> WriteResult<()> {
        if values.len() != self.schema.column_count() {
            return Err(WriteError::RowLengthMismatch {
                expected: self.schema.column_count(),
                actual: values.len(),
            });
        }
        if self.options.is_first_record_schema && !self.header_written {
            self.write_schema()?;
        }

        let row = self.rows_written + 1;
        let culture = &self.options.culture;
        let fields = self
            .schema
            .columns()
            .iter()
            .zip(values)
            .map(|(column, value)| {
                column
                    .format(value, culture)
                    .map_err(|source| WriteError::Format { row, source })
            })
            .collect::<WriteResult<Vec<String>>>()?;

        self.buf.clear();
        self.formatter.write_record(&fields, &mut self.buf);
        self.sink.write_all(self.buf.as_bytes())?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> WriteResult<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn into_inner(mut self) -> WriteResult<W> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

impl Writer<BufWriter<File>> {
    /// Create (or truncate) a file and write to it.
    pub fn create(
        path: impl AsRef<Path>,
        schema: impl Into<Arc<Schema>>,
        options: Options,
    ) -> FlatFileResult<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file), schema, options)?)
    }
}
