//! Domain models for typed flat-file data.
//!
//! - [`Value`] - A single typed cell
//! - [`Row`] - One record: an ordered tuple of values

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::schema::ColumnKind;

// =============================================================================
// Value
// =============================================================================

/// A typed cell value.
///
/// Each variant corresponds to a [`ColumnKind`]; `Null` is the missing
/// marker allowed in nullable columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
    String(String),
}

impl Value {
    /// The column kind this value naturally belongs to (`None` for null).
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ColumnKind::Boolean),
            Value::Int32(_) => Some(ColumnKind::Int32),
            Value::Int64(_) => Some(ColumnKind::Int64),
            Value::Double(_) => Some(ColumnKind::Double),
            Value::Decimal(_) => Some(ColumnKind::Decimal),
            Value::DateTime(_) => Some(ColumnKind::DateTime),
            Value::String(_) => Some(ColumnKind::String),
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::DateTime(_) => "datetime",
            Value::String(_) => "string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Row
// =============================================================================

/// One parsed or to-be-written record.
///
/// A row does not carry its schema; positions line up with the schema
/// of the reader or writer it came from or goes to.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::from(1).kind(), Some(ColumnKind::Int32));
        assert_eq!(Value::from("x").kind(), Some(ColumnKind::String));
        assert_eq!(Value::Null.kind(), None);
        assert!(Value::from(None::<i32>).is_null());
    }

    #[test]
    fn test_row_indexing() {
        let row = Row::new(vec![Value::from(123), Value::from("Bob")]);
        assert_eq!(row.len(), 2);
        assert_eq!(row[0], Value::Int32(123));
        assert_eq!(row.get(1).and_then(Value::as_str), Some("Bob"));
        assert!(row.get(2).is_none());
    }

    #[test]
    fn test_row_serialization() {
        let created = NaiveDate::from_ymd_opt(2012, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let row: Row = vec![Value::from(7), Value::Null, Value::from(created)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[7,null,"2012-12-31T00:00:00"]"#);
    }
}
