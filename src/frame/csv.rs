use std::io::Cursor;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::compute::{cast, concat_batches};
use arrow::csv::WriterBuilder;
use arrow::csv::reader::{Format, ReaderBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Local};

use crate::core::{TableRef, TabulaError};

/// Parse CSV bytes into a [`RecordBatch`], inferring the schema from the
/// content. Temporal columns are stringified (see [`normalize_temporal`]) so
/// that every loaded frame stays within the editable type set.
pub fn batch_from_csv(bytes: &[u8]) -> Result<RecordBatch, TabulaError> {
    let format = Format::default().with_header(true);

    let mut cursor = Cursor::new(bytes);
    let (schema, _) = format
        .infer_schema(&mut cursor, None)
        .map_err(|e| TabulaError::FrameError(format!("inferring CSV schema: {e}")))?;
    cursor.set_position(0);

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(cursor)
        .map_err(|e| TabulaError::FrameError(format!("reading CSV: {e}")))?;

    let batches: Vec<RecordBatch> = reader
        .collect::<Result<_, _>>()
        .map_err(|e| TabulaError::FrameError(format!("reading CSV: {e}")))?;

    let batch = if batches.is_empty() {
        RecordBatch::new_empty(schema.clone())
    } else {
        concat_batches(&schema, &batches)?
    };
    normalize_temporal(&batch)
}

/// Encode a [`RecordBatch`] as CSV bytes with a header row.
pub fn batch_to_csv(batch: &RecordBatch) -> Result<Vec<u8>, TabulaError> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
        writer.write(batch)?;
    }
    Ok(buf)
}

/// Download filename for a CSV export: `<TABLE>_<YYYYmmdd_HHMMSS>.csv`.
pub fn export_filename(table: &TableRef, now: &DateTime<Local>) -> String {
    format!("{}_{}.csv", table.name, now.format("%Y%m%d_%H%M%S"))
}

/// Cast date/time/timestamp columns to Utf8.
///
/// Schema inference turns date-like strings into temporal arrays, but the
/// edit surface and the JSON projection only carry Utf8/Int64/Float64/Boolean.
/// Stringifying on load keeps commit round-trips lossless.
fn normalize_temporal(batch: &RecordBatch) -> Result<RecordBatch, TabulaError> {
    let needs_cast = |dt: &DataType| {
        matches!(
            dt,
            DataType::Date32
                | DataType::Date64
                | DataType::Time32(_)
                | DataType::Time64(_)
                | DataType::Timestamp(_, _)
        )
    };

    if !batch.schema().fields().iter().any(|f| needs_cast(f.data_type())) {
        return Ok(batch.clone());
    }

    let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());
    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        if needs_cast(field.data_type()) {
            fields.push(Field::new(field.name(), DataType::Utf8, field.is_nullable()));
            columns.push(cast(column, &DataType::Utf8)?);
        } else {
            fields.push(field.as_ref().clone());
            columns.push(column.clone());
        }
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(TabulaError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, StringArray};

    const ORDERS_CSV: &str = "id,status,amount\n1,active,10.0\n2,active,100.0\n3,done,7.5\n";

    #[test]
    fn test_parse_infers_types() {
        let batch = batch_from_csv(ORDERS_CSV.as_bytes()).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Float64);

        let amounts = batch
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(amounts.value(1), 100.0);
    }

    #[test]
    fn test_write_read_round_trip() {
        let batch = batch_from_csv(ORDERS_CSV.as_bytes()).unwrap();
        let bytes = batch_to_csv(&batch).unwrap();
        let reread = batch_from_csv(&bytes).unwrap();
        assert_eq!(reread, batch);
    }

    #[test]
    fn test_header_only_yields_empty_batch() {
        let batch = batch_from_csv(b"id,status\n").unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(batch_from_csv(b"").is_err());
    }

    #[test]
    fn test_dates_are_stringified() {
        let csv = "id,created\n1,2024-01-14\n2,2024-02-01\n";
        let batch = batch_from_csv(csv.as_bytes()).unwrap();
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);
        let created = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(created.value(0), "2024-01-14");
    }

    #[test]
    fn test_export_filename() {
        let id = TableRef::new("SALES", "ORDERS");
        let name = export_filename(&id, &Local::now());
        assert!(name.starts_with("ORDERS_"));
        assert!(name.ends_with(".csv"));
        // ORDERS_ + YYYYmmdd_HHMMSS + .csv
        assert_eq!(name.len(), "ORDERS_".len() + 15 + ".csv".len());
    }
}
