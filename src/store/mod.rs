mod dir;
mod predicate;

pub use dir::DirStore;
pub use predicate::Predicate;

use std::collections::BTreeMap;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;

use crate::core::{TableRef, TabulaError};

/// Seam to the authoritative table store (a warehouse connection in
/// production, [`DirStore`] here and in tests).
///
/// Reads are idempotent and may be repeated freely. `overwrite_table` is a
/// destructive full replace and is never retried by the core: a failed
/// overwrite is surfaced to the caller as-is.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn list_schemas(&self) -> Result<Vec<String>, TabulaError>;

    /// Tables of a schema, keyed by display name.
    async fn list_tables(&self, schema: &str) -> Result<BTreeMap<String, TableRef>, TabulaError>;

    async fn load_table(&self, id: &TableRef) -> Result<RecordBatch, TabulaError>;

    /// Load only the rows matching `predicate`, a free-text boolean row
    /// condition interpreted by the store.
    async fn load_table_filtered(
        &self,
        id: &TableRef,
        predicate: &str,
    ) -> Result<RecordBatch, TabulaError>;

    /// Replace every row of the target table with the given batch.
    async fn overwrite_table(&self, id: &TableRef, batch: &RecordBatch)
    -> Result<(), TabulaError>;
}
