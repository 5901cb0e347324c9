//! Conversions between the in-memory tabular frame ([`RecordBatch`]) and the
//! formats crossing the service boundary: JSON rows for the HTTP surface and
//! CSV for bulk import/export.
//!
//! [`RecordBatch`]: arrow::record_batch::RecordBatch

mod csv;
mod json;

pub use csv::{batch_from_csv, batch_to_csv, export_filename};
pub use json::{BatchRows, EditedRows};
