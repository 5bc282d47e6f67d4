//! Typed record reader.
//!
//! A [`Reader`] pulls logical records from a text source, resolves its
//! schema (declared, taken from the header, or inferred from the first
//! record's width) and parses every field through its column type.
//!
//! ```rust
//! use flatfile::{Options, Reader, Value};
//!
//! let text = "id,name\n1,Ann\n2,Bob\n";
//! let mut reader = Reader::new(text.as_bytes(), Options::new().with_header(true))?;
//!
//! assert_eq!(reader.schema()?.names(), vec!["id", "name"]);
//! let names: Vec<Value> = reader
//!     .map(|row| row.map(|r| r[1].clone()))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(names, vec![Value::from("Ann"), Value::from("Bob")]);
//! # Ok::<(), flatfile::FlatFileError>(())
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::config::Options;
use crate::error::{ConfigResult, FlatFileResult, ReadError, ReadResult};
use crate::logs::{log_info, log_success, log_warning_at, Component};
use crate::models::Row;
use crate::parser::{decode_content, detect_encoding, RawRecord, RecordSource};
use crate::schema::{Culture, Schema};

/// Where a reader is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No schema yet; it comes from the first record.
    Uninitialized,
    /// Schema known, no data record returned yet.
    SchemaResolved,
    /// At least one data record returned.
    Streaming,
    /// End of input reached; `read` keeps returning `None`.
    Exhausted,
}

/// Lazy, forward-only reader of typed rows.
pub struct Reader<R> {
    records: RecordSource<R>,
    options: Options,
    schema: Option<Arc<Schema>>,
    /// Declared schema plus header flag: the first record is skipped.
    header_pending: bool,
    /// First record, read ahead to size an inferred schema.
    pending: Option<RawRecord>,
    state: ReaderState,
    line: usize,
    rows_read: usize,
}

impl<R: BufRead> Reader<R> {
    /// Reader whose schema comes from the input itself.
    pub fn new(source: R, options: Options) -> ConfigResult<Self> {
        let dialect = options.dialect()?;
        Ok(Self {
            records: RecordSource::new(source, &dialect),
            options,
            schema: None,
            header_pending: false,
            pending: None,
            state: ReaderState::Uninitialized,
            line: 0,
            rows_read: 0,
        })
    }

    /// Reader with a declared schema.
    ///
    /// With `is_first_record_schema` the header record is skipped, not
    /// parsed for types.
    pub fn with_schema(
        source: R,
        schema: impl Into<Arc<Schema>>,
        options: Options,
    ) -> ConfigResult<Self> {
        let mut reader = Self::new(source, options)?;
        reader.header_pending = reader.options.is_first_record_schema;
        reader.schema = Some(schema.into());
        reader.state = ReaderState::SchemaResolved;
        Ok(reader)
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn culture(&self) -> &Culture {
        &self.options.culture
    }

    /// Line the most recent record started on.
    pub fn line_number(&self) -> usize {
        self.line
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// The schema, resolving it from the input if needed.
    ///
    /// Empty input resolves to an empty schema.
    pub fn schema(&mut self) -> ReadResult<&Schema> {
        self.resolve()?;
        Ok(self.schema.as_deref().unwrap_or_else(|| empty_schema()))
    }

    /// Shared handle to the resolved schema.
    pub fn shared_schema(&mut self) -> ReadResult<Arc<Schema>> {
        self.resolve()
    }

    fn resolve(&mut self) -> ReadResult<Arc<Schema>> {
        if self.state == ReaderState::Uninitialized {
            let first = match self.next_raw() {
                Ok(first) => first,
                Err(e) => {
                    self.state = ReaderState::Exhausted;
                    return Err(e);
                }
            };
            let schema = match first {
                Some(header) if self.options.is_first_record_schema => {
                    let schema = Schema::infer_from_header(&header.fields).map_err(|e| {
                        self.state = ReaderState::Exhausted;
                        ReadError::from(e)
                    })?;
                    log_info(
                        Component::Reader,
                        format!("Schema resolved from header: {} columns", schema.column_count()),
                    );
                    schema
                }
                Some(record) => {
                    let schema = Schema::anonymous(record.fields.len());
                    self.pending = Some(record);
                    schema
                }
                None => Schema::new(),
            };
            self.schema = Some(Arc::new(schema));
            self.state = ReaderState::SchemaResolved;
        }

        if self.header_pending {
            self.header_pending = false;
            self.next_raw()?;
        }

        Ok(self
            .schema
            .clone()
            .unwrap_or_else(|| Arc::new(Schema::new())))
    }

    /// Next record from the source, skipping blank lines when configured.
    fn next_raw(&mut self) -> ReadResult<Option<RawRecord>> {
        loop {
            let Some(record) = self.records.next_record()? else {
                return Ok(None);
            };
            self.line = record.line;
            if record.blank && self.options.skip_blank_lines {
                log_warning_at(Component::Reader, record.line, "blank line skipped");
                continue;
            }
            return Ok(Some(record));
        }
    }

    /// Read and parse the next row; `None` once input is exhausted.
    pub fn read(&mut self) -> ReadResult<Option<Row>> {
        if self.state == ReaderState::Exhausted {
            return Ok(None);
        }
        let schema = self.resolve()?;

        let record = match self.pending.take() {
            Some(record) => Some(record),
            None => self.next_raw()?,
        };
        let Some(record) = record else {
            self.state = ReaderState::Exhausted;
            log_success(Component::Reader, format!("Read {} rows", self.rows_read));
            return Ok(None);
        };
        self.state = ReaderState::Streaming;
        self.line = record.line;

        if record.fields.len() != schema.column_count() {
            return Err(ReadError::FieldCountMismatch {
                expected: schema.column_count(),
                actual: record.fields.len(),
                line: record.line,
            });
        }

        let culture = &self.options.culture;
        let row = schema
            .columns()
            .iter()
            .zip(&record.fields)
            .map(|(column, raw)| {
                column.parse(raw, culture).map_err(|source| ReadError::Parse {
                    line: record.line,
                    source,
                })
            })
            .collect::<ReadResult<Row>>()?;

        self.rows_read += 1;
        Ok(Some(row))
    }

    pub fn into_inner(self) -> R {
        self.records.into_inner()
    }
}

fn empty_schema() -> &'static Schema {
    static EMPTY: Lazy<Schema> = Lazy::new(Schema::new);
    &EMPTY
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = ReadResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

impl Reader<BufReader<File>> {
    /// Open a UTF-8 file.
    pub fn from_path(path: impl AsRef<Path>, options: Options) -> FlatFileResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file), options)?)
    }

    /// Open a UTF-8 file with a declared schema.
    pub fn from_path_with_schema(
        path: impl AsRef<Path>,
        schema: impl Into<Arc<Schema>>,
        options: Options,
    ) -> FlatFileResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::with_schema(BufReader::new(file), schema, options)?)
    }
}

impl Reader<Cursor<String>> {
    /// Decode raw bytes (encoding auto-detected) and read from the text.
    pub fn from_bytes_auto(bytes: &[u8], options: Options) -> FlatFileResult<Self> {
        let encoding = detect_encoding(bytes);
        let content = decode_content(bytes, &encoding)?;
        Ok(Self::new(Cursor::new(content), options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;
    use crate::schema::ColumnType;
    use chrono::NaiveDate;
    use std::io::Write;

    fn typed_schema() -> Schema {
        Schema::new()
            .add_column(ColumnType::int32("id"))
            .and_then(|s| s.add_column(ColumnType::string("name")))
            .and_then(|s| s.add_column(ColumnType::date_time("created")))
            .and_then(|s| s.add_column(ColumnType::double("avg")))
            .unwrap()
    }

    #[test]
    fn test_explicit_schema_no_header() {
        let text = "123,Bob,12/31/2012,3.14159";
        let mut reader =
            Reader::with_schema(text.as_bytes(), typed_schema(), Options::new()).unwrap();
        assert_eq!(reader.state(), ReaderState::SchemaResolved);

        let row = reader.read().unwrap().unwrap();
        let created = NaiveDate::from_ymd_opt(2012, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            row.values(),
            &[
                Value::Int32(123),
                Value::from("Bob"),
                Value::DateTime(created),
                Value::Double(3.14159),
            ]
        );
        assert_eq!(reader.state(), ReaderState::Streaming);
        assert!(reader.read().unwrap().is_none());
        assert_eq!(reader.state(), ReaderState::Exhausted);
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn test_header_inference() {
        let text = "id,name,created,avg\n123,Bob,12/31/2012,3.14159\n";
        let mut reader = Reader::new(text.as_bytes(), Options::new().with_header(true)).unwrap();
        assert_eq!(reader.state(), ReaderState::Uninitialized);

        let schema = reader.schema().unwrap().clone();
        assert_eq!(schema, Schema::infer_from_header(["id", "name", "created", "avg"]).unwrap());

        let rows: Vec<Row> = reader.by_ref().collect::<ReadResult<_>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Value::from("123"));
        assert_eq!(rows[0][3], Value::from("3.14159"));
        assert_eq!(reader.rows_read(), 1);
    }

    #[test]
    fn test_explicit_schema_skips_header() {
        let text = "id,name,created,avg\n7,Ann,01/02/2003,1.5\n";
        let mut reader = Reader::with_schema(
            text.as_bytes(),
            typed_schema(),
            Options::new().with_header(true),
        )
        .unwrap();
        let row = reader.read().unwrap().unwrap();
        assert_eq!(row[0], Value::Int32(7));
        assert_eq!(reader.line_number(), 2);
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn test_deferred_schema_is_anonymous() {
        let text = "a,b\nc,d\n";
        let mut reader = Reader::new(text.as_bytes(), Options::new()).unwrap();
        assert_eq!(reader.schema().unwrap().names(), vec!["Column1", "Column2"]);
        let rows: Vec<Row> = reader.collect::<ReadResult<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::from("a"));
        assert_eq!(rows[1][1], Value::from("d"));
    }

    #[test]
    fn test_field_count_mismatch() {
        let text = "1,Bob,12/31/2012\n1,Bob,12/31/2012,1.0,extra\n";
        let mut reader =
            Reader::with_schema(text.as_bytes(), typed_schema(), Options::new()).unwrap();
        match reader.read().unwrap_err() {
            ReadError::FieldCountMismatch {
                expected,
                actual,
                line,
            } => assert_eq!((expected, actual, line), (4, 3, 1)),
            other => panic!("unexpected error: {:?}", other),
        }
        match reader.read().unwrap_err() {
            ReadError::FieldCountMismatch { actual, line, .. } => {
                assert_eq!((actual, line), (5, 2))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_has_line_and_column() {
        let text = "1,Bob,12/31/2012,1.0\nx,Bob,12/31/2012,1.0\n";
        let mut reader =
            Reader::with_schema(text.as_bytes(), typed_schema(), Options::new()).unwrap();
        assert!(reader.read().unwrap().is_some());
        let err = reader.read().unwrap_err();
        assert_eq!(err.line(), Some(2));
        match err {
            ReadError::Parse { source, .. } => assert_eq!(source.column(), "id"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_record() {
        let text = "id,name\n1,\"open\n";
        let mut reader = Reader::new(text.as_bytes(), Options::new().with_header(true)).unwrap();
        let err = reader.read().unwrap_err();
        assert!(matches!(err, ReadError::Malformed { line: 2, .. }));
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn test_blank_lines() {
        let text = "a\n\nb\n";
        let skipping = Reader::new(text.as_bytes(), Options::new()).unwrap();
        assert_eq!(skipping.count(), 2);

        let options = Options::new().with_skip_blank_lines(false);
        let keeping = Reader::new(text.as_bytes(), options).unwrap();
        let rows: Vec<Row> = keeping.collect::<ReadResult<_>>().unwrap();
        assert_eq!(rows[1][0], Value::from(""));
    }

    #[test]
    fn test_empty_input() {
        let mut reader = Reader::new("".as_bytes(), Options::new().with_header(true)).unwrap();
        assert!(reader.schema().unwrap().is_empty());
        assert!(reader.read().unwrap().is_none());
        assert_eq!(reader.state(), ReaderState::Exhausted);
    }

    #[test]
    fn test_duplicate_header_names() {
        let options = Options::new().with_header(true);
        let mut reader = Reader::new("a,a\n1,2\n".as_bytes(), options).unwrap();
        assert!(matches!(reader.read(), Err(ReadError::Schema(_))));
        assert!(reader.read().unwrap().is_none());
    }

    #[test]
    fn test_semicolon_dialect_with_culture() {
        let culture = Culture::builder()
            .decimal_separator(',')
            .group_separator('.')
            .datetime_input_patterns(["dd.MM.yyyy"])
            .datetime_output_pattern("dd.MM.yyyy")
            .build()
            .unwrap();
        let options = Options::new().with_delimiter(';').with_culture(culture);
        let text = "1;Jörg;31.12.2012;3,5";
        let mut reader = Reader::with_schema(text.as_bytes(), typed_schema(), options).unwrap();
        let row = reader.read().unwrap().unwrap();
        assert_eq!(row[3], Value::Double(3.5));
        assert!(matches!(row[2], Value::DateTime(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "id,name\n1,Ann\n").unwrap();
        let reader = Reader::from_path(file.path(), Options::new().with_header(true)).unwrap();
        assert_eq!(reader.count(), 1);
    }

    #[test]
    fn test_from_bytes_auto() {
        let bytes = b"id;name\n1;Ann\n";
        let options = Options::new().with_header(true).with_delimiter(';');
        let mut reader = Reader::from_bytes_auto(bytes, options).unwrap();
        let row = reader.read().unwrap().unwrap();
        assert_eq!(row[1], Value::from("Ann"));
    }
}
