//! Normalized result rows
//!
//! Engine batches come back with whatever types the query produced: 64-bit
//! counts, decimals, dates. Consumers only ever see three kinds of value:
//! numbers (as `f64`), text, and null.

use crate::error::Result;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow_cast::cast;
use arrow_cast::display::{ArrayFormatter, FormatOptions};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;

/// Largest integer an `f64` holds exactly
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn as_exact_int(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT => Some(*n as i64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => match self.as_exact_int() {
                Some(i) => write!(f, "{i}"),
                None => write!(f, "{n}"),
            },
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Number(n) => match self.as_exact_int() {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Ordered field name to value mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((name.into(), value.into()));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// The `count` field; zero when absent
    #[must_use]
    pub fn count(&self) -> u64 {
        self.number("count").map_or(0, |n| n.max(0.0) as u64)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Flatten engine batches into rows, narrowing every numeric column to `f64`
pub fn rows_from_batches(batches: &[RecordBatch]) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    let options = FormatOptions::default();

    for batch in batches {
        let schema = batch.schema();
        let mut columns: Vec<Vec<Value>> = Vec::with_capacity(batch.num_columns());

        for array in batch.columns() {
            columns.push(column_values(array, &options)?);
        }

        for i in 0..batch.num_rows() {
            let mut row = Row::new();
            for (field, values) in schema.fields().iter().zip(&columns) {
                row.push(field.name().clone(), values[i].clone());
            }
            rows.push(row);
        }
    }
    Ok(rows)
}

fn column_values(array: &ArrayRef, options: &FormatOptions<'_>) -> Result<Vec<Value>> {
    if array.data_type().is_numeric() {
        let floats = cast(array, &DataType::Float64)?;
        let floats = floats
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| arrow_schema::ArrowError::CastError("expected Float64".to_string()))?;
        return Ok(floats
            .iter()
            .map(|v| v.map_or(Value::Null, Value::Number))
            .collect());
    }

    let formatter = ArrayFormatter::try_new(array.as_ref(), options)?;
    Ok((0..array.len())
        .map(|i| {
            if array.is_null(i) {
                Value::Null
            } else {
                Value::Text(formatter.value(i).to_string())
            }
        })
        .collect())
}

/// Build a batch from rows for tabular rendering.
///
/// Columns come from the first row. Whole-number columns become Int64, other
/// numeric columns Float64, anything containing text Utf8.
pub fn rows_to_batch(rows: &[Row]) -> Result<RecordBatch> {
    let Some(first) = rows.first() else {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    };

    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();

    for name in first.names() {
        let values: Vec<Value> = rows
            .iter()
            .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
            .collect();

        let any_text = values.iter().any(|v| matches!(v, Value::Text(_)));
        let all_null = values.iter().all(|v| v.is_null());
        let all_int = values.iter().all(|v| v.is_null() || v.as_exact_int().is_some());

        let array: ArrayRef = if any_text || all_null {
            Arc::new(StringArray::from_iter(values.iter().map(|v| match v {
                Value::Null => None,
                other => Some(other.to_string()),
            })))
        } else if all_int {
            Arc::new(Int64Array::from_iter(values.iter().map(|v| v.as_exact_int())))
        } else {
            Arc::new(Float64Array::from_iter(values.iter().map(|v| v.as_f64())))
        };

        fields.push(Field::new(name, array.data_type().clone(), true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, Decimal128Array, UInt64Array};

    fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        RecordBatch::try_from_iter(columns).expect("valid test batch")
    }

    #[test]
    fn test_numeric_columns_narrow_to_f64() -> Result<()> {
        let decimals = Decimal128Array::from(vec![Some(1250), None])
            .with_precision_and_scale(10, 2)?;
        let batch = batch(vec![
            ("count", Arc::new(UInt64Array::from(vec![3, 1])) as ArrayRef),
            ("avg_fare", Arc::new(decimals) as ArrayRef),
        ]);

        let rows = rows_from_batches(&[batch])?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number("count"), Some(3.0));
        assert_eq!(rows[0].number("avg_fare"), Some(12.5));
        assert_eq!(rows[1].get("avg_fare"), Some(&Value::Null));
        assert_eq!(rows[1].count(), 1);
        Ok(())
    }

    #[test]
    fn test_dates_and_strings_become_text() -> Result<()> {
        // 2019-03-01 is day 17956 since the epoch
        let batch = batch(vec![
            ("day", Arc::new(Date32Array::from(vec![17956])) as ArrayRef),
            ("continent", Arc::new(StringArray::from(vec!["Europe"])) as ArrayRef),
        ]);
        let rows = rows_from_batches(&[batch])?;
        assert_eq!(rows[0].text("day"), Some("2019-03-01"));
        assert_eq!(rows[0].text("continent"), Some("Europe"));
        assert_eq!(rows[0].names().collect::<Vec<_>>(), vec!["day", "continent"]);
        Ok(())
    }

    #[test]
    fn test_json_shape() -> Result<()> {
        let row = Row::new()
            .with("payment_type", Option::<i64>::None)
            .with("count", 4_u64)
            .with("avg_tip", 1.25);
        let json = serde_json::to_string(&row)?;
        assert_eq!(json, r#"{"payment_type":null,"count":4,"avg_tip":1.25}"#);
        Ok(())
    }

    #[test]
    fn test_rows_to_batch_types() -> Result<()> {
        let rows = vec![
            Row::new().with("hour", 0_i64).with("count", 2_u64).with("avg_fare", 9.5),
            Row::new().with("hour", 1_i64).with("count", 1_u64).with("avg_fare", Option::<f64>::None),
        ];
        let batch = rows_to_batch(&rows)?;
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(batch.num_rows(), 2);

        assert_eq!(rows_to_batch(&[])?.num_columns(), 0);
        Ok(())
    }
}
