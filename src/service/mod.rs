use std::collections::BTreeMap;

use chrono::Local;
use log::info;
use tokio::sync::RwLock;

use crate::core::{TableRef, TabulaError};
use crate::frame::{EditedRows, batch_from_csv, batch_to_csv, export_filename};
use crate::session::{RenderView, Session, Transition};
use crate::store::TableStore;

/// Core-exposed interface: catalog pass-throughs plus the transition handlers
/// of the single interactive edit session.
///
/// The session sits behind a write lock, so every transition runs to
/// completion before the next one is accepted. Each handler consumes exactly
/// one UI action and returns the resulting state plus any one-shot notice.
pub struct TabulaService {
    store: Box<dyn TableStore>,
    session: RwLock<Session>,
}

impl TabulaService {
    pub fn new(store: Box<dyn TableStore>) -> Self {
        Self {
            store,
            session: RwLock::new(Session::new()),
        }
    }

    pub async fn schemas(&self) -> Result<Vec<String>, TabulaError> {
        self.store.list_schemas().await
    }

    pub async fn tables(&self, schema: &str) -> Result<BTreeMap<String, TableRef>, TabulaError> {
        self.store.list_tables(schema).await
    }

    pub async fn render(&self) -> Result<RenderView, TabulaError> {
        let mut session = self.session.write().await;
        session.render(self.store.as_ref()).await
    }

    pub async fn select_table(&self, id: TableRef) -> Result<Transition, TabulaError> {
        info!("selecting table '{}'", id);
        let mut session = self.session.write().await;
        session.select_table(self.store.as_ref(), id).await
    }

    pub async fn apply_filter(&self, text: &str) -> Result<Transition, TabulaError> {
        let mut session = self.session.write().await;
        session.apply_filter(self.store.as_ref(), text).await
    }

    pub async fn clear_filter(&self) -> Result<Transition, TabulaError> {
        let mut session = self.session.write().await;
        session.clear_filter(self.store.as_ref()).await
    }

    pub async fn rollback(&self) -> Result<Transition, TabulaError> {
        let mut session = self.session.write().await;
        let transition = session.rollback(self.store.as_ref()).await?;
        info!("rolled back edit session, now at generation {}", transition.generation);
        Ok(transition)
    }

    /// Commit the edited rows: rebuild a batch against the schema of the
    /// snapshot being edited, then full-replace the table.
    pub async fn commit(&self, edited: EditedRows) -> Result<Transition, TabulaError> {
        let mut session = self.session.write().await;
        if session.snapshot().is_none() {
            session.render(self.store.as_ref()).await?;
        }
        let schema = session
            .snapshot()
            .ok_or(TabulaError::NoTableSelected)?
            .schema();
        let batch = edited.into_record_batch(&schema)?;
        let transition = session.commit(self.store.as_ref(), batch).await?;
        info!("committed edit session, now at generation {}", transition.generation);
        Ok(transition)
    }

    /// Replace the table with externally supplied CSV data.
    pub async fn import_csv(&self, bytes: &[u8]) -> Result<Transition, TabulaError> {
        let imported = batch_from_csv(bytes)?;
        let mut session = self.session.write().await;
        let transition = session.import_replace(self.store.as_ref(), imported).await?;
        info!(
            "imported {} rows, now at generation {}",
            session.snapshot().map_or(0, |b| b.num_rows()),
            transition.generation
        );
        Ok(transition)
    }

    /// CSV export of the current view (edits included once rendered), with a
    /// timestamped download filename.
    pub async fn export_csv(&self) -> Result<(String, Vec<u8>), TabulaError> {
        let view = self.render().await?;
        let table = view.table.ok_or(TabulaError::NoTableSelected)?;
        let snapshot = view.snapshot.ok_or(TabulaError::NoTableSelected)?;
        let bytes = batch_to_csv(&snapshot)?;
        Ok((export_filename(&table, &Local::now()), bytes))
    }
}
