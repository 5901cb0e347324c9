use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::core::TabulaError;

/// Newtype to implement From<&RecordBatch> (orphan rule prevents impl for serde_json::Value).
pub struct BatchRows(pub Value);

impl TryFrom<&RecordBatch> for BatchRows {
    type Error = TabulaError;

    fn try_from(batch: &RecordBatch) -> Result<Self, TabulaError> {
        let schema = batch.schema();
        let columns: Vec<Value> = schema
            .fields()
            .iter()
            .map(|f| Value::String(f.name().clone()))
            .collect();

        let mut cells: Vec<Vec<Value>> = Vec::with_capacity(batch.num_columns());
        for column in batch.columns() {
            cells.push(array_to_json_values(column)?);
        }

        let rows: Vec<Value> = (0..batch.num_rows())
            .map(|r| Value::Array(cells.iter().map(|col| col[r].clone()).collect()))
            .collect();

        let mut outer = Map::new();
        outer.insert("columns".to_string(), Value::Array(columns));
        outer.insert("rows".to_string(), Value::Array(rows));
        Ok(BatchRows(Value::Object(outer)))
    }
}

fn array_to_json_values(array: &ArrayRef) -> Result<Vec<Value>, TabulaError> {
    macro_rules! collect_values {
        ($array_type:ty) => {{
            let arr = array.as_any().downcast_ref::<$array_type>().unwrap();
            Ok((0..arr.len())
                .map(|i| {
                    if arr.is_null(i) {
                        Value::Null
                    } else {
                        json!(arr.value(i))
                    }
                })
                .collect())
        }};
    }

    match array.data_type() {
        DataType::Utf8 => collect_values!(StringArray),
        DataType::Int64 => collect_values!(Int64Array),
        DataType::Float64 => collect_values!(Float64Array),
        DataType::Boolean => collect_values!(BooleanArray),
        other => Err(TabulaError::FrameError(format!(
            "unsupported array type: {other:?}"
        ))),
    }
}

/// Row-oriented edit payload submitted by the presentation layer on commit.
#[derive(Debug, Deserialize)]
pub struct EditedRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl EditedRows {
    /// Rebuild a [`RecordBatch`] against the schema of the snapshot currently
    /// being edited. Column order in the payload may differ from the schema;
    /// matching is by name. Any shape or type mismatch is rejected before the
    /// store is touched.
    pub fn into_record_batch(self, schema: &SchemaRef) -> Result<RecordBatch, TabulaError> {
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(TabulaError::FrameError(format!(
                    "row {i} has {} cells, expected {}",
                    row.len(),
                    self.columns.len()
                )));
            }
        }

        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let col = self
                .columns
                .iter()
                .position(|c| c == field.name())
                .ok_or_else(|| {
                    TabulaError::FrameError(format!("missing column '{}'", field.name()))
                })?;
            arrays.push(build_array(field.name(), field.data_type(), &self.rows, col)?);
        }

        RecordBatch::try_new(schema.clone(), arrays).map_err(TabulaError::from)
    }
}

fn build_array(
    name: &str,
    dtype: &DataType,
    rows: &[Vec<Value>],
    col: usize,
) -> Result<ArrayRef, TabulaError> {
    let mismatch = |row: usize, value: &Value| {
        TabulaError::FrameError(format!(
            "column '{name}' row {row}: cannot interpret {value} as {dtype:?}"
        ))
    };

    match dtype {
        DataType::Utf8 => {
            let mut values: Vec<Option<String>> = Vec::with_capacity(rows.len());
            for (r, row) in rows.iter().enumerate() {
                values.push(match &row[col] {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => return Err(mismatch(r, other)),
                });
            }
            Ok(Arc::new(StringArray::from(values)))
        }
        DataType::Int64 => {
            let mut values: Vec<Option<i64>> = Vec::with_capacity(rows.len());
            for (r, row) in rows.iter().enumerate() {
                values.push(match &row[col] {
                    Value::Null => None,
                    v @ Value::Number(n) => Some(n.as_i64().ok_or_else(|| mismatch(r, v))?),
                    other => return Err(mismatch(r, other)),
                });
            }
            Ok(Arc::new(Int64Array::from(values)))
        }
        DataType::Float64 => {
            let mut values: Vec<Option<f64>> = Vec::with_capacity(rows.len());
            for (r, row) in rows.iter().enumerate() {
                values.push(match &row[col] {
                    Value::Null => None,
                    v @ Value::Number(n) => Some(n.as_f64().ok_or_else(|| mismatch(r, v))?),
                    other => return Err(mismatch(r, other)),
                });
            }
            Ok(Arc::new(Float64Array::from(values)))
        }
        DataType::Boolean => {
            let mut values: Vec<Option<bool>> = Vec::with_capacity(rows.len());
            for (r, row) in rows.iter().enumerate() {
                values.push(match &row[col] {
                    Value::Null => None,
                    Value::Bool(b) => Some(*b),
                    other => return Err(mismatch(r, other)),
                });
            }
            Ok(Arc::new(BooleanArray::from(values)))
        }
        other => Err(TabulaError::FrameError(format!(
            "unsupported column type: {other:?}"
        ))),
    }
}
