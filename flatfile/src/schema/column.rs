//! Column types: the typed converters a schema is made of.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::culture::Culture;
use super::format::ColumnFormat;
use crate::error::{ConvertError, ConvertResult, ParseFailure, SchemaError, SchemaResult};
use crate::models::Value;

// =============================================================================
// Column Kind
// =============================================================================

/// The closed set of value kinds a column can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Int32,
    Int64,
    Boolean,
    String,
    #[serde(alias = "datetime")]
    DateTime,
    Decimal,
    Double,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Int32 => "int32",
            ColumnKind::Int64 => "int64",
            ColumnKind::Boolean => "boolean",
            ColumnKind::String => "string",
            ColumnKind::DateTime => "datetime",
            ColumnKind::Decimal => "decimal",
            ColumnKind::Double => "double",
        }
    }

    /// Whether this kind accepts an input/output format string.
    pub fn takes_format(&self) -> bool {
        !matches!(self, ColumnKind::String | ColumnKind::Boolean)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "int32" | "int" | "integer" => Ok(ColumnKind::Int32),
            "int64" | "long" | "bigint" => Ok(ColumnKind::Int64),
            "bool" | "boolean" => Ok(ColumnKind::Boolean),
            "string" | "text" | "str" => Ok(ColumnKind::String),
            "datetime" | "date_time" | "date" => Ok(ColumnKind::DateTime),
            "decimal" | "numeric" => Ok(ColumnKind::Decimal),
            "double" | "float" | "f64" => Ok(ColumnKind::Double),
            other => Err(format!("unknown column kind '{}'", other)),
        }
    }
}

// =============================================================================
// Column Type
// =============================================================================

/// One schema entry: a name, a kind and how to convert text to and from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    name: String,
    kind: ColumnKind,
    nullable: bool,
    input_format: Option<ColumnFormat>,
    output_format: Option<ColumnFormat>,
}

impl ColumnType {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            input_format: None,
            output_format: None,
        }
    }

    pub fn int32(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Int32)
    }

    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Int64)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::String)
    }

    pub fn date_time(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::DateTime)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Decimal)
    }

    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Double)
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Format used when parsing raw text.
    pub fn with_input_format(mut self, format: &str) -> SchemaResult<Self> {
        self.input_format = Some(self.compile(format)?);
        Ok(self)
    }

    /// Format used when producing text.
    pub fn with_output_format(mut self, format: &str) -> SchemaResult<Self> {
        self.output_format = Some(self.compile(format)?);
        Ok(self)
    }

    /// Same format for both directions.
    pub fn with_format(self, format: &str) -> SchemaResult<Self> {
        self.with_input_format(format)?.with_output_format(format)
    }

    fn compile(&self, format: &str) -> SchemaResult<ColumnFormat> {
        ColumnFormat::compile(self.kind, format).map_err(|message| SchemaError::InvalidFormat {
            column: self.name.clone(),
            kind: self.kind,
            format: format.to_string(),
            message,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn input_format(&self) -> Option<&str> {
        self.input_format.as_ref().map(ColumnFormat::source)
    }

    pub fn output_format(&self) -> Option<&str> {
        self.output_format.as_ref().map(ColumnFormat::source)
    }

    /// Output falls back to the input format so a column reads what it writes.
    fn effective_output(&self) -> Option<&ColumnFormat> {
        self.output_format.as_ref().or(self.input_format.as_ref())
    }

    // -------------------------------------------------------------------------
    // Parsing
    // -------------------------------------------------------------------------

    /// Convert one raw field into a typed value.
    pub fn parse(&self, raw: &str, culture: &Culture) -> ConvertResult<Value> {
        if self.kind == ColumnKind::String {
            if raw.is_empty() && self.nullable {
                return Ok(Value::Null);
            }
            return Ok(Value::String(raw.to_string()));
        }

        let text = raw.trim();
        if text.is_empty() {
            return if self.nullable {
                Ok(Value::Null)
            } else {
                Err(self.parse_error(raw, ParseFailure::KindMismatch))
            };
        }

        let failure = if self.input_format.is_some() {
            ParseFailure::FormatMismatch
        } else {
            ParseFailure::KindMismatch
        };
        let number = self
            .input_format
            .as_ref()
            .and_then(ColumnFormat::number_format)
            .copied()
            .unwrap_or_default();

        let parsed = match self.kind {
            ColumnKind::Int32 => number
                .normalize(text, culture)
                .and_then(|t| t.parse::<i32>().ok())
                .map(Value::Int32),
            ColumnKind::Int64 => number
                .normalize(text, culture)
                .and_then(|t| t.parse::<i64>().ok())
                .map(Value::Int64),
            ColumnKind::Decimal => number
                .normalize(text, culture)
                .and_then(|t| Decimal::from_str(&t).ok())
                .map(Value::Decimal),
            ColumnKind::Double => number
                .normalize(text, culture)
                .and_then(|t| t.parse::<f64>().ok())
                .map(Value::Double),
            ColumnKind::Boolean => culture.parse_bool(text).map(Value::Boolean),
            ColumnKind::DateTime => self.parse_datetime(text, culture).map(Value::DateTime),
            ColumnKind::String => Some(Value::String(raw.to_string())),
        };

        parsed.ok_or_else(|| self.parse_error(raw, failure))
    }

    fn parse_datetime(&self, text: &str, culture: &Culture) -> Option<NaiveDateTime> {
        match self.input_format.as_ref().and_then(ColumnFormat::date_pattern) {
            Some(pattern) => pattern.parse(text),
            None => culture.parse_datetime(text),
        }
    }

    fn parse_error(&self, raw: &str, failure: ParseFailure) -> ConvertError {
        ConvertError::Parse {
            column: self.name.clone(),
            kind: self.kind,
            failure,
            raw: raw.to_string(),
        }
    }

    // -------------------------------------------------------------------------
    // Formatting
    // -------------------------------------------------------------------------

    /// Convert a typed value into its field text.
    pub fn format(&self, value: &Value, culture: &Culture) -> ConvertResult<String> {
        let number = self
            .effective_output()
            .and_then(ColumnFormat::number_format)
            .copied()
            .unwrap_or_default();

        let text = match (self.kind, value) {
            (_, Value::Null) if self.nullable => String::new(),
            (_, Value::Null) => return Err(ConvertError::NullNotAllowed(self.name.clone())),
            (ColumnKind::String, Value::String(s)) => s.clone(),
            (ColumnKind::Boolean, Value::Boolean(b)) => culture.format_bool(*b).to_string(),
            (ColumnKind::Int32, Value::Int32(n)) => number.format_integer(i64::from(*n), culture),
            (ColumnKind::Int64, Value::Int32(n)) => number.format_integer(i64::from(*n), culture),
            (ColumnKind::Int64, Value::Int64(n)) => number.format_integer(*n, culture),
            (ColumnKind::Decimal, Value::Decimal(d)) => number.format_decimal(d, culture),
            (ColumnKind::Decimal, Value::Int32(n)) => {
                number.format_decimal(&Decimal::from(*n), culture)
            }
            (ColumnKind::Double, Value::Double(d)) => number.format_double(*d, culture),
            (ColumnKind::Double, Value::Int32(n)) => number.format_double(f64::from(*n), culture),
            (ColumnKind::DateTime, Value::DateTime(dt)) => {
                let pattern = self
                    .effective_output()
                    .and_then(ColumnFormat::date_pattern)
                    .unwrap_or_else(|| culture.datetime_output_pattern());
                pattern.format(dt).ok_or_else(|| self.format_error(value))?
            }
            _ => return Err(self.format_error(value)),
        };

        Ok(text)
    }

    fn format_error(&self, value: &Value) -> ConvertError {
        ConvertError::Format {
            column: self.name.clone(),
            kind: self.kind,
            found: value.type_name(),
        }
    }

    /// Serializable description of this column.
    pub fn to_spec(&self) -> ColumnSpec {
        let input = self.input_format().map(str::to_string);
        let output = self.output_format().map(str::to_string);
        let (format, input_format, output_format) = if input.is_some() && input == output {
            (input, None, None)
        } else {
            (None, input, output)
        };
        ColumnSpec {
            name: self.name.clone(),
            kind: self.kind,
            nullable: self.nullable,
            format,
            input_format,
            output_format,
        }
    }
}

// =============================================================================
// Column Spec
// =============================================================================

/// A column as declared in a JSON schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub nullable: bool,
    /// Shorthand for identical input and output formats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl TryFrom<ColumnSpec> for ColumnType {
    type Error = SchemaError;

    fn try_from(spec: ColumnSpec) -> Result<Self, Self::Error> {
        let mut column = ColumnType::new(spec.name, spec.kind).nullable(spec.nullable);
        if let Some(format) = spec.format.as_deref() {
            column = column.with_format(format)?;
        }
        if let Some(format) = spec.input_format.as_deref() {
            column = column.with_input_format(format)?;
        }
        if let Some(format) = spec.output_format.as_deref() {
            column = column.with_output_format(format)?;
        }
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn culture() -> Culture {
        Culture::invariant()
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_int32() {
        let col = ColumnType::int32("id");
        assert_eq!(col.parse("123", &culture()).unwrap(), Value::Int32(123));
        assert_eq!(col.parse(" -7 ", &culture()).unwrap(), Value::Int32(-7));

        let err = col.parse("abc", &culture()).unwrap_err();
        match err {
            ConvertError::Parse {
                column,
                failure,
                raw,
                ..
            } => {
                assert_eq!(column, "id");
                assert_eq!(failure, ParseFailure::KindMismatch);
                assert_eq!(raw, "abc");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(col.parse("2147483648", &culture()).is_err());
    }

    #[test]
    fn test_parse_datetime_with_format_mismatch() {
        let col = ColumnType::date_time("created")
            .with_input_format("MM/dd/yyyy")
            .unwrap();
        assert_eq!(
            col.parse("12/31/2012", &culture()).unwrap(),
            Value::DateTime(midnight(2012, 12, 31))
        );
        let err = col.parse("2012-12-31", &culture()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Parse {
                failure: ParseFailure::FormatMismatch,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_datetime_default_patterns() {
        let col = ColumnType::date_time("created");
        assert_eq!(
            col.parse("12/31/2012", &culture()).unwrap(),
            Value::DateTime(midnight(2012, 12, 31))
        );
    }

    #[test]
    fn test_empty_fields() {
        let c = culture();
        assert_eq!(ColumnType::string("s").parse("", &c).unwrap(), Value::from(""));
        assert_eq!(
            ColumnType::string("s").nullable(true).parse("", &c).unwrap(),
            Value::Null
        );
        assert_eq!(
            ColumnType::double("d").nullable(true).parse("  ", &c).unwrap(),
            Value::Null
        );
        assert!(ColumnType::double("d").parse("", &c).is_err());
    }

    #[test]
    fn test_strings_kept_verbatim() {
        let col = ColumnType::string("name");
        assert_eq!(col.parse("  Bob ", &culture()).unwrap(), Value::from("  Bob "));
    }

    #[test]
    fn test_format_rejects_wrong_runtime_type() {
        let col = ColumnType::int32("id");
        let err = col.format(&Value::from("Bob"), &culture()).unwrap_err();
        assert!(matches!(err, ConvertError::Format { found: "string", .. }));
        let err = col.format(&Value::Null, &culture()).unwrap_err();
        assert!(matches!(err, ConvertError::NullNotAllowed(_)));
    }

    #[test]
    fn test_format_widens_int32() {
        let c = culture();
        assert_eq!(ColumnType::int64("n").format(&Value::from(5), &c).unwrap(), "5");
        assert_eq!(ColumnType::double("n").format(&Value::from(5), &c).unwrap(), "5");
        assert_eq!(ColumnType::decimal("n").format(&Value::from(5), &c).unwrap(), "5");
    }

    #[test]
    fn test_output_falls_back_to_input_format() {
        let col = ColumnType::date_time("created")
            .with_input_format("MM/dd/yyyy")
            .unwrap();
        let text = col
            .format(&Value::DateTime(midnight(2012, 12, 31)), &culture())
            .unwrap();
        assert_eq!(text, "12/31/2012");

        let col = col.with_output_format("yyyy-MM-dd").unwrap();
        let text = col
            .format(&Value::DateTime(midnight(2012, 12, 31)), &culture())
            .unwrap();
        assert_eq!(text, "2012-12-31");
    }

    #[test]
    fn test_round_trip_every_kind() {
        let c = culture();
        let cases: Vec<(ColumnType, Value)> = vec![
            (ColumnType::int32("a"), Value::Int32(i32::MIN)),
            (ColumnType::int64("b"), Value::Int64(9_007_199_254_740_993)),
            (ColumnType::boolean("c"), Value::Boolean(true)),
            (ColumnType::string("d"), Value::from("Hello, \"World\"")),
            (
                ColumnType::date_time("e"),
                Value::DateTime(midnight(2012, 12, 31) + chrono::Duration::microseconds(1500)),
            ),
            (
                ColumnType::date_time("f").with_format("MM/dd/yyyy").unwrap(),
                Value::DateTime(midnight(1999, 1, 2)),
            ),
            (
                ColumnType::date_time("m").with_format("MM/yyyy").unwrap(),
                Value::DateTime(midnight(2012, 12, 1)),
            ),
            (
                ColumnType::date_time("t").with_format("HH:mm:ss").unwrap(),
                Value::DateTime(midnight(1, 1, 1) + chrono::Duration::hours(10)),
            ),
            (
                ColumnType::decimal("g"),
                Value::Decimal(Decimal::from_str("3.14159").unwrap()),
            ),
            (
                ColumnType::decimal("h").with_format("N2").unwrap(),
                Value::Decimal(Decimal::from_str("-1234.50").unwrap()),
            ),
            (ColumnType::double("i"), Value::Double(0.1 + 0.2)),
            (ColumnType::double("j"), Value::Double(-3.14159e-12)),
            (ColumnType::int32("k").nullable(true), Value::Null),
        ];
        for (col, value) in cases {
            let text = col.format(&value, &c).unwrap();
            assert_eq!(col.parse(&text, &c).unwrap(), value, "column {}", col.name());
        }
    }

    #[test]
    fn test_grouped_input_format() {
        let col = ColumnType::int32("n").with_input_format("N0").unwrap();
        assert_eq!(col.parse("1,234,567", &culture()).unwrap(), Value::Int32(1_234_567));
        assert!(ColumnType::int32("n").parse("1,234", &culture()).is_err());
    }

    #[test]
    fn test_stray_separator_in_comma_culture() {
        let comma = Culture::builder()
            .decimal_separator(',')
            .group_separator('.')
            .build()
            .unwrap();
        for col in [ColumnType::double("d"), ColumnType::decimal("m")] {
            let err = col.parse("1.234", &comma).unwrap_err();
            assert!(matches!(
                err,
                ConvertError::Parse {
                    failure: ParseFailure::KindMismatch,
                    ..
                }
            ));
        }
        assert_eq!(
            ColumnType::double("d").parse("1234,5", &comma).unwrap(),
            Value::Double(1234.5)
        );

        let grouped = ColumnType::decimal("m").with_input_format("N2").unwrap();
        assert_eq!(
            grouped.parse("1.234,50", &comma).unwrap(),
            Value::Decimal(Decimal::from_str("1234.50").unwrap())
        );
        let err = ColumnType::int32("n")
            .with_input_format("N0")
            .unwrap()
            .parse("1.5", &Culture::invariant())
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Parse {
                failure: ParseFailure::FormatMismatch,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_format_reports_column() {
        let err = ColumnType::string("name").with_format("F2").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat { ref column, .. } if column == "name"));
        let err = ColumnType::date_time("d").with_format("yyyy zzz").unwrap_err();
        assert!(err.to_string().contains("yyyy zzz"));
    }

    #[test]
    fn test_column_kind_from_str() {
        assert_eq!("Int".parse::<ColumnKind>().unwrap(), ColumnKind::Int32);
        assert_eq!("datetime".parse::<ColumnKind>().unwrap(), ColumnKind::DateTime);
        assert!("blob".parse::<ColumnKind>().is_err());
    }

    #[test]
    fn test_spec_round_trip() {
        let col = ColumnType::date_time("created")
            .nullable(true)
            .with_format("MM/dd/yyyy")
            .unwrap();
        let spec = col.to_spec();
        assert_eq!(spec.format.as_deref(), Some("MM/dd/yyyy"));
        assert_eq!(ColumnType::try_from(spec).unwrap(), col);
    }
}
