//! Test utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;

use crate::core::{TableRef, TabulaError};
use crate::store::{DirStore, TableStore};

/// The SALES.ORDERS fixture used throughout the tests: 3 rows, row 2 has
/// amount 100.
pub const ORDERS_CSV: &str = "id,status,amount\n1,active,10.0\n2,active,100.0\n3,done,7.5\n";

pub fn orders_ref() -> TableRef {
    TableRef::new("SALES", "ORDERS")
}

/// Build an id/status/amount batch, the same shape as [`ORDERS_CSV`].
pub fn orders_batch(rows: &[(i64, &str, f64)]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, true),
        Field::new("status", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, true),
    ]));
    let ids: Int64Array = rows.iter().map(|(id, _, _)| Some(*id)).collect();
    let statuses: StringArray = rows.iter().map(|(_, s, _)| Some(*s)).collect();
    let amounts: Float64Array = rows.iter().map(|(_, _, a)| Some(*a)).collect();
    RecordBatch::try_new(
        schema,
        vec![Arc::new(ids), Arc::new(statuses), Arc::new(amounts)],
    )
    .unwrap()
}

/// Set up a directory store seeded with the given `(schema, table, csv)`
/// fixtures. Returns the store and the temp directory (keep alive to prevent
/// cleanup).
pub fn seeded_store(tables: &[(&str, &str, &str)]) -> (DirStore, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().unwrap();
    for (schema, table, csv) in tables {
        let schema_dir = dir.path().join(schema);
        std::fs::create_dir_all(&schema_dir).unwrap();
        std::fs::write(schema_dir.join(format!("{table}.csv")), csv).unwrap();
    }
    let store = DirStore::new(dir.path()).unwrap();
    (store, dir)
}

/// A [`TableStore`] wrapper with switchable failure injection, for exercising
/// the commit/rollback failure paths. Clones share the same flags, so a kept
/// clone can flip failures on a store already owned by the service.
pub struct FlakyStore<S> {
    inner: Arc<S>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl<S> Clone for FlakyStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            fail_reads: Arc::clone(&self.fail_reads),
            fail_writes: Arc::clone(&self.fail_writes),
        }
    }
}

impl<S: TableStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner: Arc::new(inner),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read_gate(&self) -> Result<(), TabulaError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TabulaError::StoreReadFailure("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: TableStore> TableStore for FlakyStore<S> {
    async fn list_schemas(&self) -> Result<Vec<String>, TabulaError> {
        self.read_gate()?;
        self.inner.list_schemas().await
    }

    async fn list_tables(&self, schema: &str) -> Result<BTreeMap<String, TableRef>, TabulaError> {
        self.read_gate()?;
        self.inner.list_tables(schema).await
    }

    async fn load_table(&self, id: &TableRef) -> Result<RecordBatch, TabulaError> {
        self.read_gate()?;
        self.inner.load_table(id).await
    }

    async fn load_table_filtered(
        &self,
        id: &TableRef,
        predicate: &str,
    ) -> Result<RecordBatch, TabulaError> {
        self.read_gate()?;
        self.inner.load_table_filtered(id, predicate).await
    }

    async fn overwrite_table(
        &self,
        id: &TableRef,
        batch: &RecordBatch,
    ) -> Result<(), TabulaError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TabulaError::StoreWriteFailure(
                "injected failure".to_string(),
            ));
        }
        self.inner.overwrite_table(id, batch).await
    }
}
