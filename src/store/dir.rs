use std::collections::BTreeMap;
use std::path::PathBuf;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use log::{debug, info};

use crate::core::{TableRef, TabulaError};
use crate::frame::{batch_from_csv, batch_to_csv};
use crate::store::{Predicate, TableStore};

/// CSV-directory-backed [`TableStore`]: one subdirectory per schema, one
/// `<TABLE>.csv` file per table. This is the collaborator the binary runs
/// against; a warehouse client would implement the same trait.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, TabulaError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| TabulaError::IoError(format!("creating {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    fn schema_dir(&self, schema: &str) -> Result<PathBuf, TabulaError> {
        let dir = self.root.join(schema);
        if !dir.is_dir() {
            return Err(TabulaError::SchemaNotFound(schema.to_string()));
        }
        Ok(dir)
    }

    fn table_path(&self, id: &TableRef) -> PathBuf {
        self.root.join(&id.schema).join(format!("{}.csv", id.name))
    }
}

#[async_trait]
impl TableStore for DirStore {
    async fn list_schemas(&self) -> Result<Vec<String>, TabulaError> {
        let mut schemas = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    schemas.push(name.to_string());
                }
            }
        }
        schemas.sort();
        Ok(schemas)
    }

    async fn list_tables(&self, schema: &str) -> Result<BTreeMap<String, TableRef>, TabulaError> {
        let dir = self.schema_dir(schema)?;
        let mut tables = BTreeMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let name = match path.file_stem().and_then(|n| n.to_str()) {
                Some(name) if !name.starts_with('.') => name.to_string(),
                _ => continue,
            };
            tables.insert(name.clone(), TableRef::new(schema, name));
        }
        Ok(tables)
    }

    async fn load_table(&self, id: &TableRef) -> Result<RecordBatch, TabulaError> {
        let path = self.table_path(id);
        if !path.is_file() {
            return Err(TabulaError::TableNotFound(id.to_string()));
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| TabulaError::StoreReadFailure(format!("{id}: {e}")))?;
        let batch = batch_from_csv(&bytes)
            .map_err(|e| TabulaError::StoreReadFailure(format!("{id}: {e}")))?;
        debug!("loaded table '{}' ({} rows)", id, batch.num_rows());
        Ok(batch)
    }

    async fn load_table_filtered(
        &self,
        id: &TableRef,
        predicate: &str,
    ) -> Result<RecordBatch, TabulaError> {
        let predicate = Predicate::parse(predicate)?;
        let batch = self.load_table(id).await?;
        let filtered = predicate.apply(&batch)?;
        debug!(
            "loaded table '{}' filtered ({} of {} rows)",
            id,
            filtered.num_rows(),
            batch.num_rows()
        );
        Ok(filtered)
    }

    async fn overwrite_table(
        &self,
        id: &TableRef,
        batch: &RecordBatch,
    ) -> Result<(), TabulaError> {
        let dir = self.schema_dir(&id.schema)?;
        let bytes = batch_to_csv(batch)
            .map_err(|e| TabulaError::StoreWriteFailure(format!("{id}: {e}")))?;

        // Write-then-rename so a failed write never truncates the table.
        let tmp = dir.join(format!(".{}.csv.tmp", id.name));
        std::fs::write(&tmp, &bytes)
            .map_err(|e| TabulaError::StoreWriteFailure(format!("{id}: {e}")))?;
        std::fs::rename(&tmp, self.table_path(id))
            .map_err(|e| TabulaError::StoreWriteFailure(format!("{id}: {e}")))?;

        info!("replaced table '{}' ({} rows)", id, batch.num_rows());
        Ok(())
    }
}
